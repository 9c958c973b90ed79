/// Depth-sorted software renderer drawing onto a 2D canvas
use nalgebra::Vector3;

use crate::geometry::Mesh;
use crate::plane::FittedPlane;
use crate::projection::{Frame, ScreenPoint};
use crate::selection::SelectionSet;

/// Lowest lighting intensity, so faces turned away from the light stay visible
pub const AMBIENT_FLOOR: f32 = 0.3;
/// Face gray level at full intensity
pub const FACE_GRAY: u8 = 200;
/// Alpha of the fitted plane fill
pub const PLANE_ALPHA: u8 = 128;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const DARK_GRAY: Color = Color::rgb(169, 169, 169);
    pub const LIGHT_BLUE: Color = Color::rgb(173, 216, 230);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const DARK_GREEN: Color = Color::rgb(0, 100, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Scale the color channels by `intensity`, keeping alpha
    pub fn lit(self, intensity: f32) -> Self {
        let scale = |c: u8| (c as f32 * intensity).clamp(0.0, 255.0) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }
}

/// A 2D drawing surface in top-left pixel coordinates
pub trait Canvas {
    fn clear(&mut self, color: Color);

    /// Fill a closed convex polygon
    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color);

    /// Outline a closed polygon
    fn stroke_polygon(&mut self, points: &[(f32, f32)], color: Color, width: f32);
}

/// Colors and lighting used by [`render`]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub background: Color,
    pub face: Color,
    pub selection: Color,
    pub wireframe: Color,
    pub wireframe_width: f32,
    pub plane: Color,
    pub plane_outline: Color,
    pub plane_outline_width: f32,
    /// Direction towards the light, normalized on use
    pub light_direction: Vector3<f32>,
    pub ambient_floor: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            background: Color::DARK_GRAY,
            face: Color::rgb(FACE_GRAY, FACE_GRAY, FACE_GRAY),
            selection: Color::LIGHT_BLUE,
            wireframe: Color::BLACK,
            wireframe_width: 1.0,
            plane: Color::GREEN.with_alpha(PLANE_ALPHA),
            plane_outline: Color::DARK_GREEN,
            plane_outline_width: 2.0,
            light_direction: Vector3::new(1.0, 1.0, 1.0),
            ambient_floor: AMBIENT_FLOOR,
        }
    }
}

/// What to draw in one frame
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub mesh: &'a Mesh,
    pub selection: &'a SelectionSet,
    /// Fitted plane and the half-width of its drawn square
    pub plane: Option<(FittedPlane, f32)>,
}

/// A projected triangle that survived near-plane culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleFace {
    pub index: usize,
    pub points: [ScreenPoint; 3],
    /// Average projected depth of the vertices
    pub depth: f32,
    pub intensity: f32,
}

/// Project, light and sort the mesh faces farthest first
pub fn depth_sorted_faces(mesh: &Mesh, frame: &Frame, settings: &RenderSettings) -> Vec<VisibleFace> {
    let light = settings
        .light_direction
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::z);

    let mut faces: Vec<VisibleFace> = mesh
        .triangles()
        .iter()
        .enumerate()
        .filter_map(|(index, triangle)| {
            let points = frame.project_triangle(&triangle.vertices)?;
            let depth = points.iter().map(|p| p.depth).sum::<f32>() / 3.0;

            let diffuse = frame
                .rotate_normal(&triangle.normal)
                .try_normalize(f32::EPSILON)
                .map_or(0.0, |n| n.dot(&light));

            Some(VisibleFace {
                index,
                points,
                depth,
                intensity: diffuse.max(settings.ambient_floor),
            })
        })
        .collect();

    // Painter's algorithm; intersecting faces may still be misordered
    faces.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    faces
}

/// Draw the scene onto `canvas`
pub fn render<C: Canvas + ?Sized>(canvas: &mut C, scene: &Scene<'_>, frame: &Frame, settings: &RenderSettings) {
    canvas.clear(settings.background);

    let faces = depth_sorted_faces(scene.mesh, frame, settings);
    for face in &faces {
        let path = face.points.map(|p| frame.viewport.to_pixel(p.x, p.y));

        let base = if scene.selection.contains(face.index) {
            settings.selection
        } else {
            settings.face
        };

        canvas.fill_polygon(&path, base.lit(face.intensity));
        canvas.stroke_polygon(&path, settings.wireframe, settings.wireframe_width);
    }

    if let Some((plane, extent)) = &scene.plane {
        draw_plane(canvas, plane, *extent, frame, settings);
    }

    tracing::trace!(drawn = faces.len(), total = scene.mesh.triangle_count(), "rendered frame");
}

fn draw_plane<C: Canvas + ?Sized>(
    canvas: &mut C,
    plane: &FittedPlane,
    extent: f32,
    frame: &Frame,
    settings: &RenderSettings,
) {
    let mut path = Vec::with_capacity(4);
    for corner in plane.quad(extent) {
        let Some(p) = frame.project(&corner).filter(|p| !p.is_behind_near_plane()) else {
            tracing::trace!("fitted plane corner in front of the near plane, skipping plane");
            return;
        };
        path.push(frame.viewport.to_pixel(p.x, p.y));
    }

    canvas.fill_polygon(&path, settings.plane);
    canvas.stroke_polygon(&path, settings.plane_outline, settings.plane_outline_width);
}
