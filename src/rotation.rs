//! Coordinate rotation utilities
//!
//! Drawing happens in logical coordinates; the packer works on the panel's
//! physical (portrait) canvas. [`to_physical`] maps one onto the other.
//!
//! ## Rotation Modes
//!
//! - **Rotate0**: Native orientation
//! - **Rotate90**: 90° clockwise, width and height swapped
//! - **Rotate180**: 180° rotation, origin at bottom-right
//! - **Rotate270**: 270° clockwise; the landscape layout of the 2.7" module
//!
//! ## Example
//!
//! ```
//! use epd_weather::{rotation::to_physical, Rotation};
//!
//! // Landscape origin lands in the bottom-left corner of a 176x264 panel
//! assert_eq!(to_physical(0, 0, 176, 264, Rotation::Rotate270), (0, 263));
//! ```

use crate::config::Rotation;

/// Map logical `(x, y)` to physical canvas coordinates
///
/// `width` and `height` are the physical (unrotated) panel dimensions. The
/// caller must keep `(x, y)` inside the logical (rotated) bounds.
pub fn to_physical(x: u32, y: u32, width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    match rotation {
        Rotation::Rotate0 => (x, y),
        Rotation::Rotate90 => (width - 1 - y, x),
        Rotation::Rotate180 => (width - 1 - x, height - 1 - y),
        Rotation::Rotate270 => (y, height - 1 - x),
    }
}
