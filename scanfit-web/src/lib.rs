/// Scanfit Web - browser host drawing onto a 2D canvas
///
/// The page creates a `WebViewer` for a canvas element id, forwards pointer
/// and wheel events in canvas pixel coordinates and calls `render()` after
/// each change.
use scanfit_core::{Canvas, Color, Viewer};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// `CanvasRenderingContext2d` as a render target
struct ContextCanvas<'a> {
    context: &'a CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl ContextCanvas<'_> {
    fn trace_path(&self, points: &[(f32, f32)]) {
        self.context.begin_path();
        if let Some((&(x, y), rest)) = points.split_first() {
            self.context.move_to(x as f64, y as f64);
            for &(x, y) in rest {
                self.context.line_to(x as f64, y as f64);
            }
        }
        self.context.close_path();
    }
}

impl Canvas for ContextCanvas<'_> {
    fn clear(&mut self, color: Color) {
        self.context.set_fill_style(&JsValue::from_str(&css_color(color)));
        self.context.fill_rect(0.0, 0.0, self.width, self.height);
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) {
        self.trace_path(points);
        self.context.set_fill_style(&JsValue::from_str(&css_color(color)));
        self.context.fill();
    }

    fn stroke_polygon(&mut self, points: &[(f32, f32)], color: Color, width: f32) {
        self.trace_path(points);
        self.context.set_stroke_style(&JsValue::from_str(&css_color(color)));
        self.context.set_line_width(width as f64);
        self.context.stroke();
    }
}

fn css_color(color: Color) -> String {
    if color.a == u8::MAX {
        format!("rgb({}, {}, {})", color.r, color.g, color.b)
    } else {
        format!(
            "rgba({}, {}, {}, {:.3})",
            color.r,
            color.g,
            color.b,
            color.a as f32 / 255.0
        )
    }
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

#[wasm_bindgen]
pub struct WebViewer {
    viewer: Viewer,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

#[wasm_bindgen]
impl WebViewer {
    /// Bind to the canvas element with the given id
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebViewer, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| js_error("no document available"))?;

        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| js_error(format!("no element with id {canvas_id}")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error(format!("element {canvas_id} is not a canvas")))?;

        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| js_error("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let mut viewer = Viewer::new();
        viewer.set_viewport(canvas.width() as f32, canvas.height() as f32);
        tracing::info!(canvas = canvas_id, "web viewer attached");

        Ok(WebViewer {
            viewer,
            canvas,
            context,
        })
    }

    /// Load a binary STL; on failure the current mesh stays loaded
    #[wasm_bindgen(js_name = loadMesh)]
    pub fn load_mesh(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.viewer.load_mesh(bytes).map_err(js_error)
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.viewer.on_pointer_down(x, y);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.viewer.on_pointer_move(x, y);
    }

    /// Returns the toggled face index after a tap
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f32, y: f32) -> Option<u32> {
        self.viewer.on_pointer_up(x, y).map(|face| face as u32)
    }

    pub fn wheel(&mut self, delta: f32) {
        self.viewer.on_wheel(delta);
    }

    pub fn render(&mut self) {
        let (width, height) = (self.canvas.width() as f64, self.canvas.height() as f64);
        let mut target = ContextCanvas {
            context: &self.context,
            width,
            height,
        };
        self.viewer.render(&mut target, width as f32, height as f32);
    }

    #[wasm_bindgen(js_name = togglePlane)]
    pub fn toggle_plane(&mut self) {
        self.viewer.toggle_plane_display();
    }

    #[wasm_bindgen(js_name = setPlaneSize)]
    pub fn set_plane_size(&mut self, factor: f32) {
        self.viewer.set_plane_size_factor(factor);
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        self.viewer.clear_selection();
    }

    #[wasm_bindgen(js_name = selectedFaceCount)]
    pub fn selected_face_count(&self) -> u32 {
        self.viewer.selected_face_count() as u32
    }

    /// `[a, b, c, d]` of the fitted plane, or `undefined`
    #[wasm_bindgen(js_name = planeEquation)]
    pub fn plane_equation(&self) -> Option<Vec<f32>> {
        self.viewer.plane_equation().map(|eq| eq.as_array().to_vec())
    }

    #[wasm_bindgen(js_name = planeInfoText)]
    pub fn plane_info_text(&self) -> String {
        self.viewer.plane_info_text()
    }

    #[wasm_bindgen(js_name = statusText)]
    pub fn status_text(&self) -> String {
        self.viewer.status_text()
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_color() {
        assert_eq!(css_color(Color::LIGHT_BLUE), "rgb(173, 216, 230)");
        assert_eq!(css_color(Color::GREEN.with_alpha(128)), "rgba(0, 128, 0, 0.502)");
    }
}
