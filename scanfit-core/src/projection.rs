/// Camera, viewport and screen projection
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};

use crate::transform::{Transform, ViewState};

/// Homogeneous `w` at or below this is treated as at or behind the camera
const MIN_CLIP_W: f32 = 1e-6;

/// Fixed viewing camera: on +Z looking at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            near: 0.1,
            far: 100.0,
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Right-handed perspective mapping depth to `[0, 1]` between near and far
    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        let y_scale = 1.0 / (self.fov / 2.0).tan();
        let x_scale = y_scale / aspect;
        let range = self.near - self.far;

        #[rustfmt::skip]
        let projection = Matrix4::new(
            x_scale, 0.0, 0.0, 0.0,
            0.0, y_scale, 0.0, 0.0,
            0.0, 0.0, self.far / range, self.near * self.far / range,
            0.0, 0.0, -1.0, 0.0,
        );
        projection
    }

    /// Build everything the renderer and picker need for one frame
    pub fn frame(&self, view: &ViewState, viewport: Viewport) -> Frame {
        let mvp = Transform::mvp_matrix(
            &view.model_matrix(),
            &self.view_matrix(),
            &self.projection_matrix(viewport.aspect()),
        );

        Frame {
            mvp,
            rotation: view.rotation_matrix(),
            viewport,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Drawing surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Dimensions below one pixel are clamped to one
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Top-left pixel coordinates to centered, Y-up screen coordinates
    pub fn to_centered(&self, px: f32, py: f32) -> (f32, f32) {
        (px - self.width / 2.0, -(py - self.height / 2.0))
    }

    /// Centered, Y-up screen coordinates to top-left pixel coordinates
    pub fn to_pixel(&self, x: f32, y: f32) -> (f32, f32) {
        (x + self.width / 2.0, self.height / 2.0 - y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// A projected point in centered screen coordinates with NDC depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

impl ScreenPoint {
    /// In front of the near plane, excluded from drawing and picking
    pub fn is_behind_near_plane(&self) -> bool {
        self.depth < 0.0
    }
}

/// Project a point through `mvp` into centered screen coordinates.
///
/// Returns `None` when the point is at or behind the camera.
pub fn project(point: &Point3<f32>, mvp: &Matrix4<f32>, viewport: &Viewport) -> Option<ScreenPoint> {
    let clip: Vector4<f32> = mvp * point.to_homogeneous();

    if clip.w <= MIN_CLIP_W {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    Some(ScreenPoint {
        x: ndc.x * viewport.width / 2.0,
        y: ndc.y * viewport.height / 2.0,
        depth: ndc.z,
    })
}

/// Per-frame matrices shared by the renderer and the picker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub mvp: Matrix4<f32>,
    /// Rotation-only part of the model transform, applied to face normals
    pub rotation: Matrix3<f32>,
    pub viewport: Viewport,
}

impl Frame {
    pub fn project(&self, point: &Point3<f32>) -> Option<ScreenPoint> {
        project(point, &self.mvp, &self.viewport)
    }

    /// Project all three vertices, or `None` if any is unusable
    pub fn project_triangle(&self, vertices: &[Point3<f32>; 3]) -> Option<[ScreenPoint; 3]> {
        let a = self.project(&vertices[0])?;
        let b = self.project(&vertices[1])?;
        let c = self.project(&vertices[2])?;

        [a, b, c]
            .iter()
            .all(|p| !p.is_behind_near_plane())
            .then_some([a, b, c])
    }

    pub fn rotate_normal(&self, normal: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * normal
    }
}
