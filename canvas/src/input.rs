//! Input model: raw pointer and wheel events as the host forwards them.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

impl WheelDelta {
    #[must_use]
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Whether the vertical scroll points down (away from the user).
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.dy > 0.0
    }
}

/// A pointer or wheel event on the scene, in screen pixels relative to the
/// canvas' top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Wheel(WheelDelta),
}
