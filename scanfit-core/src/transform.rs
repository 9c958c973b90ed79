/// Model transformation and interaction view state
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Vector3};

use crate::geometry::Bounds;

/// Radians of rotation per pixel of pointer movement
pub const ROTATION_SENSITIVITY: f32 = 0.01;
/// Scale multiplier applied for a positive wheel delta
pub const ZOOM_IN_FACTOR: f32 = 1.1;
/// Scale multiplier applied for a negative wheel delta
pub const ZOOM_OUT_FACTOR: f32 = 0.9;
/// A freshly loaded mesh is scaled so its largest extent spans this many units
pub const FIT_EXTENT: f32 = 2.0;

/// Accumulated pointer deltas around the X and Y axes (in input pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in input pixels)
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Angles in radians
    pub fn radians(&self) -> (f32, f32) {
        (self.x * ROTATION_SENSITIVITY, self.y * ROTATION_SENSITIVITY)
    }
}

/// Rotation, zoom and centering of the displayed mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub rotation: RotationState,
    pub scale: f32,
    pub center: Point3<f32>,
}

impl ViewState {
    /// Reset rotation and fit the scale and center to a newly loaded mesh
    pub fn reset_for(&mut self, bounds: &Bounds) {
        self.rotation = RotationState::zero();
        self.center = bounds.center();

        let max_dimension = bounds.max_dimension();
        self.scale = if max_dimension > f32::EPSILON {
            FIT_EXTENT / max_dimension
        } else {
            tracing::debug!("degenerate mesh bounds, keeping unit scale");
            1.0
        };
    }

    /// Apply a wheel step. Zero deltas are ignored.
    pub fn zoom(&mut self, delta: f32) {
        if delta > 0.0 {
            self.scale *= ZOOM_IN_FACTOR;
        } else if delta < 0.0 {
            self.scale *= ZOOM_OUT_FACTOR;
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::model_matrix(&self.center, self.scale, &self.rotation)
    }

    pub fn rotation_matrix(&self) -> Matrix3<f32> {
        Transform::rotation_matrix(&self.rotation)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            rotation: RotationState::zero(),
            scale: 1.0,
            center: Point3::origin(),
        }
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation applied about X first, then Y
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix3<f32> {
        let (rx, ry) = rotation.radians();
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), rx);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), ry);

        (ry * rx).into_inner()
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a uniform scale matrix
    pub fn scale_matrix(s: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(s)
    }

    /// Translate the center to the origin, scale, then rotate about X and Y
    pub fn model_matrix(center: &Point3<f32>, scale: f32, rotation: &RotationState) -> Matrix4<f32> {
        let translation = Self::translation_matrix(-center.x, -center.y, -center.z);
        let rotation = Self::rotation_matrix(rotation).to_homogeneous();

        rotation * Self::scale_matrix(scale) * translation
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
