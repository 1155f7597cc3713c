//! Occupancy grid messages and the raster visual built from them.
//!
//! [`OccupancyGridMsg`] mirrors `nav_msgs/OccupancyGrid` as it arrives from
//! the bridge (JSON). [`OccupancyGrid::from_message`] turns one into an RGBA
//! raster plus its placement in the scene: map cells are laid out with the
//! y axis pointing up, the screen with y pointing down, so rows are flipped
//! and the origin is mirrored.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use serde::{Deserialize, Serialize};

use crate::consts::{CELL_FREE, CELL_OCCUPIED, GRAY_FREE, GRAY_OCCUPIED, GRAY_UNKNOWN};

/// Error returned by [`OccupancyGrid::from_message`].
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum GridError {
    /// `data` does not hold exactly `width * height` cells.
    #[error("grid data has {actual} cells, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    /// Resolution is zero, negative, or not finite.
    #[error("invalid grid resolution: {0}")]
    InvalidResolution(f64),
    /// Width or height is zero.
    #[error("grid has zero width or height")]
    Empty,
    /// The raster for `width x height` cells does not fit in memory.
    #[error("grid of {width}x{height} cells is too large")]
    TooLarge { width: u32, height: u32 },
}

/// Timestamp as seconds plus nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    #[serde(default)]
    pub secs: i64,
    #[serde(default)]
    pub nsecs: i64,
}

/// Standard message header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub seq: u32,
    #[serde(default)]
    pub stamp: Time,
    #[serde(default)]
    pub frame_id: String,
}

/// Position in map coordinates (meters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

/// Orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default = "one")]
    pub w: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for Quaternion {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }
}

impl Quaternion {
    /// Rotation about the z axis in radians.
    #[must_use]
    pub fn yaw(&self) -> f64 {
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny_cosp.atan2(cosy_cosp)
    }
}

/// Pose of the grid's cell (0, 0) corner in the map frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub orientation: Quaternion,
}

/// Grid dimensions and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMetaData {
    #[serde(default)]
    pub map_load_time: Time,
    /// Meters per cell.
    pub resolution: f64,
    /// Cells per row.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    #[serde(default)]
    pub origin: Pose,
}

/// A decoded `nav_msgs/OccupancyGrid` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGridMsg {
    #[serde(default)]
    pub header: Header,
    pub info: MapMetaData,
    /// Row-major cells starting at the origin; `-1` unknown, `0..=100` probability.
    pub data: Vec<i8>,
}

/// Renderable raster built from an occupancy grid message.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    /// RGBA, top row first.
    pixels: Vec<u8>,
    x: f64,
    y: f64,
    scale: f64,
    rotation_deg: f64,
    frame_id: String,
}

impl OccupancyGrid {
    /// Build the raster for a message.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] when the dimensions, resolution, or cell count
    /// are inconsistent.
    pub fn from_message(msg: &OccupancyGridMsg) -> Result<Self, GridError> {
        let info = &msg.info;
        if info.width == 0 || info.height == 0 {
            return Err(GridError::Empty);
        }
        if !info.resolution.is_finite() || info.resolution <= 0.0 {
            return Err(GridError::InvalidResolution(info.resolution));
        }
        let too_large = GridError::TooLarge { width: info.width, height: info.height };
        let width = usize::try_from(info.width).map_err(|_| too_large.clone())?;
        let height = usize::try_from(info.height).map_err(|_| too_large.clone())?;
        let expected = width.checked_mul(height).ok_or_else(|| too_large.clone())?;
        let pixel_len = expected.checked_mul(4).ok_or(too_large)?;
        if msg.data.len() != expected {
            return Err(GridError::SizeMismatch { expected, actual: msg.data.len() });
        }

        let mut pixels = Vec::with_capacity(pixel_len);
        for row in 0..height {
            let src_row = height - row - 1;
            for &cell in &msg.data[src_row * width..(src_row + 1) * width] {
                let gray = cell_gray(cell);
                pixels.extend_from_slice(&[gray, gray, gray, 255]);
            }
        }

        let origin = info.origin;
        let world_height = f64::from(info.height) * info.resolution;
        Ok(Self {
            width: info.width,
            height: info.height,
            pixels,
            x: origin.position.x,
            y: -(origin.position.y + world_height),
            scale: info.resolution,
            rotation_deg: -origin.orientation.yaw().to_degrees(),
            frame_id: msg.header.frame_id.clone(),
        })
    }

    /// Raster width in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA bytes, top row first.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA of the cell at raster column `col`, row `row` (row 0 = top).
    #[must_use]
    pub fn pixel(&self, col: u32, row: u32) -> Option<[u8; 4]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let i = (row as usize * self.width as usize + col as usize) * 4;
        let px = self.pixels.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Left edge in scene units.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Top edge in scene units (map y mirrored).
    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Scene units per raster pixel (the map resolution).
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Clockwise rotation in degrees.
    #[must_use]
    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    /// Frame the map was published in.
    #[must_use]
    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    /// Width in scene units.
    #[must_use]
    pub fn world_width(&self) -> f64 {
        f64::from(self.width) * self.scale
    }

    /// Height in scene units.
    #[must_use]
    pub fn world_height(&self) -> f64 {
        f64::from(self.height) * self.scale
    }
}

fn cell_gray(cell: i8) -> u8 {
    match cell {
        CELL_OCCUPIED => GRAY_OCCUPIED,
        CELL_FREE => GRAY_FREE,
        _ => GRAY_UNKNOWN,
    }
}
