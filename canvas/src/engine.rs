use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlCanvasElement;

use crate::render;
use crate::scene::Container;

/// Browser-side renderer bound to one canvas element.
///
/// The engine owns no scene state: it draws whatever container it is handed,
/// so several clients can share one canvas by sharing one root container.
pub struct Engine {
    canvas: HtmlCanvasElement,
    scratch: HtmlCanvasElement,
    viewport_width: f64,
    viewport_height: f64,
    dpr: f64,
}

impl Engine {
    /// Create an engine bound to the given canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the offscreen staging canvas cannot be created.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let document = canvas
            .owner_document()
            .ok_or_else(|| JsValue::from_str("canvas is not attached to a document"))?;
        let scratch = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(JsValue::from)?;
        let viewport_width = f64::from(canvas.width());
        let viewport_height = f64::from(canvas.height());
        Ok(Self { canvas, scratch, viewport_width, viewport_height, dpr: 1.0 })
    }

    /// Update viewport dimensions and device pixel ratio.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = dpr;
        self.canvas.set_width((width_css * dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * dpr).round().max(0.0) as u32);
    }

    /// Draw `root` to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&self, root: &Container) -> Result<(), JsValue> {
        let ctx = render::context_2d(&self.canvas)?;
        render::draw(&ctx, &self.scratch, root, self.viewport_width, self.viewport_height, self.dpr)
    }
}
