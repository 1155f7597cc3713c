//! Pan and zoom views over a scene container.
//!
//! Both views follow the same two-step protocol: a `start_*` call snapshots
//! the container's current transform, and each following `pan` / `zoom`
//! call sets the transform as an absolute offset from that snapshot. The
//! views know nothing about pointer events; the caller decides when a
//! gesture starts.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use crate::camera::Point;
use crate::consts::DEFAULT_MIN_SCALE;
use crate::scene::Container;

/// Translates a container in response to a drag.
#[derive(Debug, Clone)]
pub struct PanView {
    root: Container,
    /// Pointer position passed to `start_pan`.
    start: Point,
    /// Container translation when the pan started.
    start_pos: Point,
}

impl PanView {
    #[must_use]
    pub fn new(root: &Container) -> Self {
        Self { root: root.clone(), start: Point::default(), start_pos: root.camera().position() }
    }

    /// Anchor a pan at `start` and remember the current translation.
    pub fn start_pan(&mut self, start: Point) {
        self.start = start;
        self.start_pos = self.root.camera().position();
    }

    /// Move the container so that it is offset by `current - start` from
    /// where it was when the pan started.
    pub fn pan(&mut self, current: Point) {
        self.root.set_position(
            self.start_pos.x + current.x - self.start.x,
            self.start_pos.y + current.y - self.start.y,
        );
    }
}

/// Scales a container about a focal point in response to a wheel gesture.
#[derive(Debug, Clone)]
pub struct ZoomView {
    root: Container,
    min_scale: f64,
    /// Screen point that stays fixed while zooming.
    center: Point,
    /// Container translation when the zoom started.
    start_shift: Point,
    start_scale_x: f64,
    start_scale_y: f64,
}

impl ZoomView {
    /// Create a zoom view with the default minimum scale.
    #[must_use]
    pub fn new(root: &Container) -> Self {
        Self::with_min_scale(root, DEFAULT_MIN_SCALE)
    }

    /// Create a zoom view that never shrinks either axis below `min_scale`.
    #[must_use]
    pub fn with_min_scale(root: &Container, min_scale: f64) -> Self {
        let camera = root.camera();
        Self {
            root: root.clone(),
            min_scale,
            center: Point::default(),
            start_shift: camera.position(),
            start_scale_x: camera.scale_x,
            start_scale_y: camera.scale_y,
        }
    }

    /// Smallest scale a zoom may produce.
    #[must_use]
    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    /// Begin a zoom about `center` (screen pixels).
    pub fn start_zoom(&mut self, center: Point) {
        let camera = self.root.camera();
        self.center = center;
        self.start_shift = camera.position();
        self.start_scale_x = camera.scale_x;
        self.start_scale_y = camera.scale_y;
    }

    /// Scale the container to `factor` times its scale at `start_zoom`,
    /// keeping the focal point fixed on screen.
    ///
    /// Non-positive factors are ignored.
    pub fn zoom(&mut self, factor: f64) {
        if factor <= 0.0 {
            return;
        }
        let mut factor = factor;
        if self.start_scale_x * factor < self.min_scale {
            factor = self.min_scale / self.start_scale_x;
        }
        if self.start_scale_y * factor < self.min_scale {
            factor = self.min_scale / self.start_scale_y;
        }

        self.root.set_scale(self.start_scale_x * factor, self.start_scale_y * factor);
        self.root.set_position(
            self.start_shift.x - (self.center.x - self.start_shift.x) * (factor - 1.0),
            self.start_shift.y - (self.center.y - self.start_shift.y) * (factor - 1.0),
        );
    }
}
