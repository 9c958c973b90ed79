/// Selected face indices
use std::collections::BTreeSet;

/// Unique face indices into the loaded mesh, iterated in ascending order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    faces: BTreeSet<usize>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the face if absent, remove it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, face: usize) -> bool {
        if self.faces.remove(&face) {
            false
        } else {
            self.faces.insert(face);
            true
        }
    }

    pub fn insert(&mut self, face: usize) -> bool {
        self.faces.insert(face)
    }

    pub fn contains(&self, face: usize) -> bool {
        self.faces.contains(&face)
    }

    pub fn clear(&mut self) {
        self.faces.clear();
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.faces.iter().copied()
    }
}

impl FromIterator<usize> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            faces: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle(4));
        assert!(selection.contains(4));
        assert!(!selection.toggle(4));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_unique_sorted() {
        let selection: SelectionSet = [5, 1, 5, 3].into_iter().collect();
        assert_eq!(selection.len(), 3);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
    }
}
