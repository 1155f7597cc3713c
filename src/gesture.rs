//! Pointer and wheel wiring onto the pan and zoom views.
//!
//! Pointer-down arms a drag and anchors a pan; pointer-move pans while armed
//! and always records the pointer as the zoom focal point; pointer-up
//! disarms. Each wheel event zooms about the last recorded pointer position
//! by a single step from a base factor of 1.0.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use canvas::camera::Point;
use canvas::consts::WHEEL_ZOOM_STEP;
use canvas::input::{InputEvent, WheelDelta};
use canvas::scene::Container;
use canvas::view::{PanView, ZoomView};

/// What a handler did to the view, so the host knows whether to redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewChange {
    /// The view was not touched.
    None,
    /// The scene was panned by this offset from the drag origin.
    Panned { dx: f64, dy: f64 },
    /// The scene was scaled by `factor` about `focal`.
    Zoomed { factor: f64, focal: Point },
}

/// Interaction state shared by the pointer and wheel handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    /// Pointer position at the last pointer-down.
    pub origin: Point,
    /// A drag is in progress.
    pub active: bool,
    /// Last pointer position seen by pointer-move; the zoom focal point.
    pub last_pointer: Point,
    /// Factor applied by the last wheel event.
    pub zoom_factor: f64,
}

impl Default for GestureState {
    fn default() -> Self {
        Self { origin: Point::default(), active: false, last_pointer: Point::default(), zoom_factor: 1.0 }
    }
}

/// Drives a [`PanView`] and a [`ZoomView`] from raw input.
#[derive(Debug, Clone)]
pub struct GestureController {
    state: GestureState,
    pan: PanView,
    zoom: ZoomView,
}

impl GestureController {
    #[must_use]
    pub fn new(root: &Container, min_scale: f64) -> Self {
        Self { state: GestureState::default(), pan: PanView::new(root), zoom: ZoomView::with_min_scale(root, min_scale) }
    }

    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn handle(&mut self, event: InputEvent) -> ViewChange {
        match event {
            InputEvent::PointerDown(p) => self.pointer_down(p),
            InputEvent::PointerMove(p) => self.pointer_move(p),
            InputEvent::PointerUp(p) => self.pointer_up(p),
            InputEvent::Wheel(delta) => self.wheel(delta),
        }
    }

    pub fn pointer_down(&mut self, screen_pt: Point) -> ViewChange {
        self.pan.start_pan(Point::default());
        self.state.origin = screen_pt;
        self.state.active = true;
        ViewChange::None
    }

    pub fn pointer_move(&mut self, screen_pt: Point) -> ViewChange {
        let change = if self.state.active {
            let dx = screen_pt.x - self.state.origin.x;
            let dy = screen_pt.y - self.state.origin.y;
            self.pan.pan(Point::new(dx, dy));
            ViewChange::Panned { dx, dy }
        } else {
            ViewChange::None
        };
        self.state.last_pointer = screen_pt;
        change
    }

    pub fn pointer_up(&mut self, _screen_pt: Point) -> ViewChange {
        self.state.active = false;
        ViewChange::None
    }

    pub fn wheel(&mut self, delta: WheelDelta) -> ViewChange {
        let focal = self.state.last_pointer;
        self.zoom.start_zoom(focal);
        let mut factor = 1.0;
        if delta.is_positive() {
            factor += WHEEL_ZOOM_STEP;
        } else {
            factor -= WHEEL_ZOOM_STEP;
        }
        self.zoom.zoom(factor);
        self.state.zoom_factor = factor;
        ViewChange::Zoomed { factor, focal }
    }
}
