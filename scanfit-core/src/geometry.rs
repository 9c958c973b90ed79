/// Geometry primitives for loaded surface meshes
use nalgebra::{Point3, Vector3};

/// A triangle face with its stored unit normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub normal: Vector3<f32>,
    pub vertices: [Point3<f32>; 3],
}

impl Triangle {
    pub fn new(normal: Vector3<f32>, v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) -> Self {
        Self {
            normal,
            vertices: [v0, v1, v2],
        }
    }

    /// Build a triangle whose normal is derived from the winding of its vertices
    pub fn from_vertices(v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) -> Self {
        let normal = (v1 - v0)
            .cross(&(v2 - v0))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        Self::new(normal, v0, v1, v2)
    }

    /// Mean of the three vertices
    pub fn center(&self) -> Point3<f32> {
        let [a, b, c] = self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    /// Tightest box around the given triangles, or a degenerate box at the origin
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut points = triangles.iter().flat_map(|t| t.vertices.iter());

        let Some(first) = points.next() else {
            return Self::default();
        };

        let mut min = *first;
        let mut max = *first;
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }

        Self { min, max }
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Largest of the three extents
    pub fn max_dimension(&self) -> f32 {
        self.extents().max()
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f32 {
        self.extents().norm()
    }

    pub fn contains(&self, p: &Point3<f32>) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Point3::origin(),
            max: Point3::origin(),
        }
    }
}

/// A triangle mesh. Triangle order is the face index used for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    bounds: Bounds,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let bounds = Bounds::from_triangles(&triangles);
        Self { triangles, bounds }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Create an axis-aligned cube centered at the origin (12 triangles).
    ///
    /// The first two faces form the `+Z` side.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let p = Point3::new;
        let quads = [
            // +Z
            [p(-h, -h, h), p(h, -h, h), p(h, h, h), p(-h, h, h)],
            // -Z
            [p(-h, -h, -h), p(-h, h, -h), p(h, h, -h), p(h, -h, -h)],
            // +Y
            [p(-h, h, -h), p(-h, h, h), p(h, h, h), p(h, h, -h)],
            // -Y
            [p(-h, -h, -h), p(h, -h, -h), p(h, -h, h), p(-h, -h, h)],
            // +X
            [p(h, -h, -h), p(h, h, -h), p(h, h, h), p(h, -h, h)],
            // -X
            [p(-h, -h, -h), p(-h, -h, h), p(-h, h, h), p(-h, h, -h)],
        ];

        let triangles = quads
            .iter()
            .flat_map(|[a, b, c, d]| {
                [
                    Triangle::from_vertices(*a, *b, *c),
                    Triangle::from_vertices(*a, *c, *d),
                ]
            })
            .collect();

        Self::new(triangles)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces_and_normals() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.triangle_count(), 12);

        for t in cube.triangles() {
            // Stored normal points away from the center
            let outward = t.center().coords.normalize();
            assert!(t.normal.dot(&outward) > 0.5);
        }

        assert!((cube.triangles()[0].normal - Vector3::z()).norm() < 1e-6);
        assert!((cube.triangles()[1].normal - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_bounds_contain_every_vertex() {
        let triangles = vec![
            Triangle::from_vertices(
                Point3::new(-3.0, 0.5, 2.0),
                Point3::new(1.0, -7.0, 0.0),
                Point3::new(0.0, 0.0, 9.5),
            ),
            Triangle::from_vertices(
                Point3::new(4.0, 4.0, -1.0),
                Point3::new(-0.5, 2.0, 3.0),
                Point3::new(2.0, 8.0, 1.0),
            ),
        ];
        let mesh = Mesh::new(triangles);
        let bounds = mesh.bounds();

        for t in mesh.triangles() {
            for v in &t.vertices {
                assert!(bounds.contains(v));
            }
        }
        assert_eq!(bounds.min, Point3::new(-3.0, -7.0, -1.0));
        assert_eq!(bounds.max, Point3::new(4.0, 8.0, 9.5));
        assert!((bounds.max_dimension() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_mesh_bounds_at_origin() {
        let mesh = Mesh::default();
        assert_eq!(*mesh.bounds(), Bounds::default());
        assert_eq!(mesh.bounds().max_dimension(), 0.0);
        assert_eq!(mesh.bounds().center(), Point3::origin());
    }

    #[test]
    fn test_triangle_center() {
        let t = Triangle::from_vertices(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 3.0),
        );
        assert!((t.center() - Point3::new(1.0, 1.0, 1.0)).norm() < 1e-6);
    }
}
