/// Screen-space face picking and tap detection
use nalgebra::Vector3;

use crate::geometry::Mesh;
use crate::projection::Frame;

/// Faces whose rotated normal has a view-axis component at or below this are not pickable
pub const BACKFACE_THRESHOLD: f32 = -0.2;
/// Barycentric denominators smaller than this mark a degenerate projection
pub const DEGENERATE_EPSILON: f32 = 1e-4;
/// Pointer travel (per axis, in pixels) that turns a tap into a drag
pub const TAP_THRESHOLD: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickSettings {
    pub backface_threshold: f32,
    pub degenerate_epsilon: f32,
    pub tap_threshold: f32,
}

impl Default for PickSettings {
    fn default() -> Self {
        Self {
            backface_threshold: BACKFACE_THRESHOLD,
            degenerate_epsilon: DEGENERATE_EPSILON,
            tap_threshold: TAP_THRESHOLD,
        }
    }
}

/// Find the nearest front-facing face under a pixel position (top-left origin)
pub fn pick_face(px: f32, py: f32, mesh: &Mesh, frame: &Frame, settings: &PickSettings) -> Option<usize> {
    let (x, y) = frame.viewport.to_centered(px, py);
    let view_axis = Vector3::z();

    let mut closest: Option<(usize, f32)> = None;
    for (index, triangle) in mesh.triangles().iter().enumerate() {
        let Some([a, b, c]) = frame.project_triangle(&triangle.vertices) else {
            continue;
        };

        let normal = frame.rotate_normal(&triangle.normal);
        if normal.dot(&view_axis) <= settings.backface_threshold {
            continue;
        }

        let Some(weights) = barycentric((a.x, a.y), (b.x, b.y), (c.x, c.y), (x, y), settings.degenerate_epsilon)
        else {
            tracing::trace!(face = index, "degenerate projected face skipped");
            continue;
        };
        if !weights.iter().all(|w| (0.0..=1.0).contains(w)) {
            continue;
        }

        let depth = (a.depth + b.depth + c.depth) / 3.0;
        if closest.map_or(true, |(_, best)| depth < best) {
            closest = Some((index, depth));
        }
    }

    closest.map(|(index, _)| index)
}

/// Barycentric weights of `p` in triangle `v0 v1 v2`, or `None` if the
/// triangle is degenerate
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
    epsilon: f32,
) -> Option<[f32; 3]> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < epsilon {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some([w0, w1, w2])
}

/// Distinguishes taps from drag gestures between pointer down and up
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TapTracker {
    origin: Option<(f32, f32)>,
    last: (f32, f32),
    dragging: bool,
}

impl TapTracker {
    pub fn press(&mut self, x: f32, y: f32) {
        self.origin = Some((x, y));
        self.last = (x, y);
        self.dragging = false;
    }

    /// Record a move and return the delta from the previous position.
    /// Returns `None` when no press is active.
    pub fn moved(&mut self, x: f32, y: f32, threshold: f32) -> Option<(f32, f32)> {
        let (ox, oy) = self.origin?;
        if (x - ox).abs() > threshold || (y - oy).abs() > threshold {
            self.dragging = true;
        }

        let delta = (x - self.last.0, y - self.last.1);
        self.last = (x, y);
        Some(delta)
    }

    /// End the gesture; returns whether it was a tap
    pub fn release(&mut self, x: f32, y: f32, threshold: f32) -> bool {
        let Some((ox, oy)) = self.origin.take() else {
            return false;
        };
        let was_dragging = std::mem::take(&mut self.dragging);

        !was_dragging && (x - ox).abs() < threshold && (y - oy).abs() < threshold
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::projection::{Camera, Viewport};
    use crate::transform::ViewState;
    use nalgebra::Point3;

    fn front_view(mesh: &Mesh) -> Frame {
        let mut view = ViewState::default();
        view.reset_for(mesh.bounds());
        Camera::new().frame(&view, Viewport::new(400.0, 400.0))
    }

    #[test]
    fn test_barycentric_inside_and_degenerate() {
        let w = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0), 1e-4).unwrap();
        assert!((w[0] - 0.5).abs() < 1e-6);
        assert!((w[1] - 0.25).abs() < 1e-6);
        assert!((w[2] - 0.25).abs() < 1e-6);

        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0), 1e-4).is_none());
    }

    #[test]
    fn test_pick_front_face_of_cube() {
        let mesh = Mesh::cube(1.0);
        let frame = front_view(&mesh);
        let settings = PickSettings::default();

        // Just right of center and slightly below the diagonal: first +Z triangle
        let face = pick_face(230.0, 230.0, &mesh, &frame, &settings);
        assert_eq!(face, Some(0));

        // Upper left half of the +Z side
        let face = pick_face(170.0, 170.0, &mesh, &frame, &settings);
        assert_eq!(face, Some(1));
    }

    #[test]
    fn test_pick_outside_mesh() {
        let mesh = Mesh::cube(1.0);
        let frame = front_view(&mesh);
        assert_eq!(pick_face(5.0, 5.0, &mesh, &frame, &PickSettings::default()), None);
        assert_eq!(pick_face(395.0, 200.0, &mesh, &frame, &PickSettings::default()), None);
    }

    #[test]
    fn test_nearest_of_stacked_faces() {
        let far = Triangle::new(
            Vector3::z(),
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(0.0, 1.0, -1.0),
        );
        let near = Triangle::new(
            Vector3::z(),
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        );
        let mesh = Mesh::new(vec![far, near]);
        let frame = front_view(&mesh);

        assert_eq!(pick_face(200.0, 200.0, &mesh, &frame, &PickSettings::default()), Some(1));
    }

    #[test]
    fn test_backfaces_skipped() {
        let back = Triangle::new(
            -Vector3::z(),
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let mesh = Mesh::new(vec![back]);
        let frame = front_view(&mesh);
        assert_eq!(pick_face(200.0, 200.0, &mesh, &frame, &PickSettings::default()), None);

        // Grazing faces stay pickable
        let grazing = Triangle {
            normal: Vector3::new(0.0, 0.99, -0.1).normalize(),
            ..back
        };
        let mesh = Mesh::new(vec![grazing]);
        assert_eq!(pick_face(200.0, 200.0, &mesh, &frame, &PickSettings::default()), Some(0));
    }

    #[test]
    fn test_tap_versus_drag() {
        let mut tap = TapTracker::default();
        tap.press(10.0, 10.0);
        assert_eq!(tap.moved(13.0, 9.0, TAP_THRESHOLD), Some((3.0, -1.0)));
        assert!(!tap.is_dragging());
        assert!(tap.release(14.0, 12.0, TAP_THRESHOLD));

        tap.press(10.0, 10.0);
        tap.moved(30.0, 10.0, TAP_THRESHOLD);
        assert!(tap.is_dragging());
        // Coming back to the start does not turn the drag into a tap
        tap.moved(10.0, 10.0, TAP_THRESHOLD);
        assert!(!tap.release(10.0, 10.0, TAP_THRESHOLD));

        tap.press(0.0, 0.0);
        assert!(!tap.release(8.0, 0.0, TAP_THRESHOLD));

        // Release without press
        assert!(!tap.release(0.0, 0.0, TAP_THRESHOLD));
        assert_eq!(tap.moved(1.0, 1.0, TAP_THRESHOLD), None);
    }
}
