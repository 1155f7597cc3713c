//! Rendering: draws a scene container to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads the container's camera and children and produces pixels; it
//! does not mutate the scene.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::grid::OccupancyGrid;
use crate::scene::{Container, NodeKind};

/// Draw every child of `root` bottom-first.
///
/// `scratch` is an offscreen canvas used to stage grid rasters so they can be
/// drawn through the current transform. `viewport_w` and `viewport_h` are in
/// CSS pixels. `dpr` is the device pixel ratio.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    scratch: &HtmlCanvasElement,
    root: &Container,
    viewport_w: f64,
    viewport_h: f64,
    dpr: f64,
) -> Result<(), JsValue> {
    let camera = root.camera();

    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, viewport_w, viewport_h);
    ctx.translate(camera.x, camera.y)?;
    ctx.scale(camera.scale_x, camera.scale_y)?;
    ctx.set_image_smoothing_enabled(false);

    root.with_children(|nodes| {
        for node in nodes {
            match &node.kind {
                NodeKind::Empty => {}
                NodeKind::Grid(grid) => draw_grid(ctx, scratch, grid)?,
            }
        }
        Ok(())
    })
}

fn draw_grid(ctx: &CanvasRenderingContext2d, scratch: &HtmlCanvasElement, grid: &OccupancyGrid) -> Result<(), JsValue> {
    let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(grid.pixels()), grid.width(), grid.height())?;

    scratch.set_width(grid.width());
    scratch.set_height(grid.height());
    let scratch_ctx = context_2d(scratch)?;
    scratch_ctx.put_image_data(&image, 0.0, 0.0)?;

    ctx.save();
    ctx.translate(grid.x(), grid.y())?;
    ctx.rotate(grid.rotation_deg().to_radians())?;
    ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
        scratch,
        0.0,
        0.0,
        grid.world_width(),
        grid.world_height(),
    )?;
    ctx.restore();
    Ok(())
}

/// Fetch the 2D context of a canvas element.
///
/// # Errors
///
/// Returns `Err` if the browser refuses a 2D context for the element.
pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}
