/// Interactive viewer session: the state a host drives with input events
use nalgebra::Point3;

use crate::geometry::Mesh;
use crate::picking::{pick_face, PickSettings, TapTracker};
use crate::plane::{self, FittedPlane, PlaneEquation};
use crate::projection::{Camera, Frame, Viewport};
use crate::render::{self, Canvas, Color, RenderSettings, Scene, PLANE_ALPHA};
use crate::selection::SelectionSet;
use crate::stl::{self, FormatError};
use crate::transform::ViewState;

pub const MIN_PLANE_SIZE: f32 = 0.1;
pub const MAX_PLANE_SIZE: f32 = 5.0;

pub const NO_PLANE_TEXT: &str = "No plane fitted. Select at least 3 faces.";
pub const NO_SELECTION_TEXT: &str = "Select faces to fit a plane";

/// A loaded mesh with its view, face selection and plane display settings.
///
/// Every mutating call leaves the state consistent; hosts call [`Viewer::render`]
/// afterwards to redraw.
#[derive(Debug, Clone)]
pub struct Viewer {
    mesh: Option<Mesh>,
    view: ViewState,
    selection: SelectionSet,
    camera: Camera,
    viewport: Viewport,
    tap: TapTracker,
    show_plane: bool,
    plane_size: f32,
    render_settings: RenderSettings,
    pick_settings: PickSettings,
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            mesh: None,
            view: ViewState::default(),
            selection: SelectionSet::new(),
            camera: Camera::new(),
            viewport: Viewport::default(),
            tap: TapTracker::default(),
            show_plane: false,
            plane_size: 1.0,
            render_settings: RenderSettings::default(),
            pick_settings: PickSettings::default(),
        }
    }

    /// Decode and display a binary STL buffer.
    ///
    /// On failure the previously loaded mesh, view and selection are kept.
    pub fn load_mesh(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        match stl::decode(bytes) {
            Ok(mesh) => {
                self.set_mesh(mesh);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected mesh data");
                Err(err)
            }
        }
    }

    /// Replace the mesh, resetting the view and clearing the selection
    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.view.reset_for(mesh.bounds());
        self.selection.clear();
        self.tap = TapTracker::default();
        tracing::info!(
            triangles = mesh.triangle_count(),
            scale = self.view.scale,
            "loaded mesh"
        );
        self.mesh = Some(mesh);
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Size used for picking until the next render
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frame(&self) -> Frame {
        self.camera.frame(&self.view, self.viewport)
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        self.tap.press(x, y);
    }

    /// Rotate the model by the pointer movement while a pointer is down
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if let Some((dx, dy)) = self.tap.moved(x, y, self.pick_settings.tap_threshold) {
            self.rotate_by(dx, dy);
        }
    }

    /// Finish a gesture; a tap toggles the face under the pointer.
    ///
    /// Returns the toggled face index.
    pub fn on_pointer_up(&mut self, x: f32, y: f32) -> Option<usize> {
        if !self.tap.release(x, y, self.pick_settings.tap_threshold) {
            return None;
        }

        let face = self.pick(x, y)?;
        let selected = self.selection.toggle(face);
        tracing::debug!(face, selected, "toggled face");
        Some(face)
    }

    pub fn on_wheel(&mut self, delta: f32) {
        self.view.zoom(delta);
    }

    /// Horizontal movement spins about Y, vertical about X
    pub fn rotate_by(&mut self, dx: f32, dy: f32) {
        self.view.rotation.rotate(dy, dx);
    }

    /// Face under a pixel position with the current view, without toggling it
    pub fn pick(&self, x: f32, y: f32) -> Option<usize> {
        let mesh = self.mesh.as_ref()?;
        pick_face(x, y, mesh, &self.frame(), &self.pick_settings)
    }

    pub fn render<C: Canvas + ?Sized>(&mut self, canvas: &mut C, width: f32, height: f32) {
        self.set_viewport(width, height);

        let Some(mesh) = &self.mesh else {
            canvas.clear(self.render_settings.background);
            return;
        };

        let plane = if self.show_plane {
            plane::fit(mesh, &self.selection)
                .map(|p| (p, mesh.bounds().diagonal() * self.plane_size * 0.5))
        } else {
            None
        };

        let scene = Scene {
            mesh,
            selection: &self.selection,
            plane,
        };
        render::render(canvas, &scene, &self.frame(), &self.render_settings);
    }

    pub fn toggle_plane_display(&mut self) {
        self.show_plane = !self.show_plane;
    }

    pub fn set_plane_display(&mut self, show: bool) {
        self.show_plane = show;
    }

    pub fn plane_display(&self) -> bool {
        self.show_plane
    }

    /// Set the drawn plane size relative to the model, clamped to `[0.1, 5.0]`
    pub fn set_plane_size_factor(&mut self, factor: f32) {
        self.plane_size = if factor.is_nan() {
            MIN_PLANE_SIZE
        } else {
            factor.clamp(MIN_PLANE_SIZE, MAX_PLANE_SIZE)
        };
    }

    pub fn plane_size_factor(&self) -> f32 {
        self.plane_size
    }

    pub fn set_selection_color(&mut self, color: Color) {
        self.render_settings.selection = color;
    }

    /// Plane fill color with the given alpha, or the default translucency of 128
    pub fn set_plane_color(&mut self, color: Color, alpha: Option<u8>) {
        self.render_settings.plane = color.with_alpha(alpha.unwrap_or(PLANE_ALPHA));
    }

    pub fn render_settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.render_settings
    }

    pub fn pick_settings_mut(&mut self) -> &mut PickSettings {
        &mut self.pick_settings
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selected_face_count(&self) -> usize {
        self.selection.len()
    }

    pub fn selected_faces(&self) -> Vec<usize> {
        self.selection.iter().collect()
    }

    /// Select a face by index; out-of-range indices are ignored
    pub fn select_face(&mut self, face: usize) -> bool {
        match &self.mesh {
            Some(mesh) if face < mesh.triangle_count() => self.selection.insert(face),
            _ => false,
        }
    }

    /// Plane through the current selection, recomputed on every call
    pub fn fitted_plane(&self) -> Option<FittedPlane> {
        plane::fit(self.mesh.as_ref()?, &self.selection)
    }

    pub fn plane_equation(&self) -> Option<PlaneEquation> {
        self.fitted_plane().map(|p| p.equation())
    }

    pub fn distance_to_plane(&self, point: &Point3<f32>) -> Option<f32> {
        self.plane_equation().map(|eq| eq.distance_to(point))
    }

    pub fn plane_info_text(&self) -> String {
        match self.plane_equation() {
            Some(eq) => format!("Plane equation: {eq}"),
            None => NO_PLANE_TEXT.to_string(),
        }
    }

    /// Selection summary for a status line
    pub fn status_text(&self) -> String {
        match self.selected_face_count() {
            0 => NO_SELECTION_TEXT.to_string(),
            n => format!("Selected faces: {n}\n{}", self.plane_info_text()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}
