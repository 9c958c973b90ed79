/// Least-squares plane fitting through selected face centers
use std::fmt;

use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

use crate::geometry::Mesh;
use crate::selection::SelectionSet;

/// Fewest faces that define a plane
pub const MIN_FIT_FACES: usize = 3;

/// Eigenvectors shorter than this are treated as degenerate
const NORMALIZE_EPSILON: f32 = 1e-10;
const EIGEN_EPSILON: f32 = f32::EPSILON;
const EIGEN_MAX_ITERATIONS: usize = 100;

/// A plane through `point` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedPlane {
    pub point: Point3<f32>,
    pub normal: Vector3<f32>,
    /// Root-mean-square distance of the fitted face centers to the plane
    pub rms_residual: f32,
}

impl FittedPlane {
    pub fn equation(&self) -> PlaneEquation {
        PlaneEquation {
            a: self.normal.x,
            b: self.normal.y,
            c: self.normal.z,
            d: -self.normal.dot(&self.point.coords),
        }
    }

    pub fn distance_to(&self, point: &Point3<f32>) -> f32 {
        self.equation().distance_to(point)
    }

    /// Two orthonormal vectors spanning the plane
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let n = self.normal;
        let helper = if n.x.abs() < 0.1 && n.y.abs() < 0.1 {
            Vector3::x()
        } else {
            Vector3::z()
        };

        let u = n.cross(&helper).normalize();
        let v = n.cross(&u).normalize();
        (u, v)
    }

    /// Corners of a square of half-width `extent` centered on `point`
    pub fn quad(&self, extent: f32) -> [Point3<f32>; 4] {
        let (u, v) = self.basis();
        let (u, v) = (u * extent, v * extent);
        [
            self.point + u + v,
            self.point + u - v,
            self.point - u - v,
            self.point - u + v,
        ]
    }
}

/// `a·x + b·y + c·z + d = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEquation {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl PlaneEquation {
    pub fn distance_to(&self, p: &Point3<f32>) -> f32 {
        let numerator = (self.a * p.x + self.b * p.y + self.c * p.z + self.d).abs();
        let denominator = (self.a * self.a + self.b * self.b + self.c * self.c).sqrt();
        numerator / denominator
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

impl fmt::Display for PlaneEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4}x + {:.4}y + {:.4}z + {:.4} = 0",
            self.a, self.b, self.c, self.d
        )
    }
}

/// Fit a plane through the centers of the selected faces.
///
/// Indices that do not resolve to a triangle are ignored. Returns `None` when
/// fewer than [`MIN_FIT_FACES`] faces remain or the geometry is not finite.
pub fn fit(mesh: &Mesh, selection: &SelectionSet) -> Option<FittedPlane> {
    let faces: Vec<_> = selection.iter().filter_map(|i| mesh.triangle(i)).collect();
    if faces.len() < MIN_FIT_FACES {
        tracing::trace!(faces = faces.len(), "not enough faces for a plane fit");
        return None;
    }

    let centers: Vec<Point3<f32>> = faces.iter().map(|t| t.center()).collect();
    let n = centers.len() as f32;
    let centroid = centers.iter().fold(Vector3::zeros(), |acc, c| acc + c.coords) / n;

    let covariance = centers.iter().fold(Matrix3::zeros(), |acc, c| {
        let d = c.coords - centroid;
        acc + d * d.transpose()
    });

    let mut normal = smallest_eigenvector(&covariance)?;

    // Face the side the selected faces face, so the sign is stable between fits
    let facing: Vector3<f32> = faces.iter().map(|t| t.normal).sum();
    if normal.dot(&facing) < 0.0 {
        normal = -normal;
    }

    let offsets: Vec<f32> = centers.iter().map(|c| normal.dot(&c.coords)).collect();
    let d = offsets.iter().sum::<f32>() / n;
    let rms_residual = (offsets.iter().map(|o| (o - d).powi(2)).sum::<f32>() / n).sqrt();

    let plane = FittedPlane {
        point: Point3::from(normal * d),
        normal,
        rms_residual,
    };
    tracing::debug!(faces = centers.len(), equation = %plane.equation(), "fitted plane");
    Some(plane)
}

/// Unit eigenvector of the smallest eigenvalue of a symmetric matrix
fn smallest_eigenvector(matrix: &Matrix3<f32>) -> Option<Vector3<f32>> {
    if !matrix.iter().all(|v| v.is_finite()) {
        tracing::debug!("non-finite covariance, skipping plane fit");
        return None;
    }

    let eigen = SymmetricEigen::try_new(*matrix, EIGEN_EPSILON, EIGEN_MAX_ITERATIONS)?;
    let (index, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;

    eigen
        .eigenvectors
        .column(index)
        .into_owned()
        .try_normalize(NORMALIZE_EPSILON)
}
