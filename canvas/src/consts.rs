//! Shared numeric constants for the canvas crate.

// ── Zoom ────────────────────────────────────────────────────────

/// Smallest scale a zoom gesture may shrink the scene to, per axis.
pub const DEFAULT_MIN_SCALE: f64 = 0.001;

/// Per-tick change applied to the base zoom factor of 1.0 by a wheel event.
pub const WHEEL_ZOOM_STEP: f64 = 0.1;

// ── Occupancy raster ────────────────────────────────────────────

/// Cell value meaning "certainly occupied".
pub const CELL_OCCUPIED: i8 = 100;

/// Cell value meaning "certainly free".
pub const CELL_FREE: i8 = 0;

/// Gray level drawn for occupied cells.
pub const GRAY_OCCUPIED: u8 = 0;

/// Gray level drawn for free cells.
pub const GRAY_FREE: u8 = 255;

/// Gray level drawn for unknown (`-1`) and intermediate cells.
pub const GRAY_UNKNOWN: u8 = 127;
