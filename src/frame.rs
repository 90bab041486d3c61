//! Frame buffer packing
//!
//! A [`Canvas`] is the logical 1-bit image, one `bool` per pixel. The
//! controller wants 8 horizontal pixels per byte, MSB first, with a set bit
//! meaning "light". [`pack`] performs that conversion; rows whose width is
//! not a multiple of 8 are padded with light pixels.
//!
//! ## Example
//!
//! ```
//! use epd_weather::{frame, Canvas, Geometry};
//!
//! let geometry = Geometry::new(8, 1).unwrap();
//! let mut canvas = Canvas::new(geometry);
//! canvas.set(0, 0, true);
//!
//! let packed = frame::pack(&canvas, geometry).unwrap();
//! assert_eq!(packed.as_bytes(), &[0x7F]);
//! ```

use alloc::vec;
use alloc::vec::Vec;

use crate::config::Geometry;
use crate::error::FrameError;

/// Color plane of the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plane {
    /// Black/white plane
    Black,
    /// Red accent plane
    Accent,
}

impl Plane {
    /// Planes in transmission order
    pub const ALL: [Self; 2] = [Self::Black, Self::Accent];
}

/// Logical monochrome image
///
/// Row-major, `true` = dark. Out-of-range writes are ignored and
/// out-of-range reads return light.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    geometry: Geometry,
    pixels: Vec<bool>,
}

impl Canvas {
    /// Create an all-light canvas
    pub fn new(geometry: Geometry) -> Self {
        let len = geometry.width as usize * geometry.height as usize;
        Self {
            geometry,
            pixels: vec![false; len],
        }
    }

    /// Canvas dimensions
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Width in pixels
    pub fn width(&self) -> u16 {
        self.geometry.width
    }

    /// Height in pixels
    pub fn height(&self) -> u16 {
        self.geometry.height
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        let (w, h) = (u32::from(self.geometry.width), u32::from(self.geometry.height));
        (x < w && y < h).then(|| (y * w + x) as usize)
    }

    /// Whether the pixel at `(x, y)` is dark
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        self.index(x, y).is_some_and(|i| self.pixels[i])
    }

    /// Set the pixel at `(x, y)`
    pub fn set(&mut self, x: u32, y: u32, dark: bool) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = dark;
        }
    }

    /// Set every pixel
    pub fn fill(&mut self, dark: bool) {
        self.pixels.fill(dark);
    }

    /// Number of dark pixels
    pub fn dark_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }

    /// Pack against the canvas' own geometry
    pub fn pack(&self) -> PackedFrame {
        pack_rows(self)
    }
}

/// Controller wire format of one plane
///
/// `ceil(width / 8) * height` bytes, MSB first, bit 1 = light.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedFrame(Vec<u8>);

impl PackedFrame {
    /// A frame of `geometry` with every pixel light
    pub fn blank(geometry: Geometry) -> Self {
        Self(vec![0xFF; geometry.buffer_size()])
    }

    /// Wrap raw bytes; the length is checked when the frame is used
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Packed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the frame holds no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the byte vector
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Pack `canvas` into the controller wire format
///
/// # Errors
///
/// Returns `FrameError::InvalidFrameSize` if the canvas dimensions differ
/// from `geometry`.
pub fn pack(canvas: &Canvas, geometry: Geometry) -> Result<PackedFrame, FrameError> {
    if canvas.geometry() != geometry {
        return Err(FrameError::InvalidFrameSize {
            expected: geometry,
            provided: canvas.geometry(),
        });
    }
    Ok(pack_rows(canvas))
}

fn pack_rows(canvas: &Canvas) -> PackedFrame {
    let geometry = canvas.geometry();
    let stride = geometry.bytes_per_row();
    // Start from all-light so padding columns stay set
    let mut bytes = vec![0xFFu8; geometry.buffer_size()];

    for y in 0..u32::from(geometry.height) {
        let row = y as usize * stride;
        for x in 0..u32::from(geometry.width) {
            if canvas.is_dark(x, y) {
                bytes[row + x as usize / 8] &= !(0x80 >> (x % 8));
            }
        }
    }

    PackedFrame(bytes)
}

/// Rebuild a canvas from a packed frame
///
/// Padding bits are dropped, so the result equals the packed canvas exactly.
///
/// # Errors
///
/// Returns `FrameError::InvalidLength` if the byte count does not match
/// `geometry`.
pub fn unpack(frame: &PackedFrame, geometry: Geometry) -> Result<Canvas, FrameError> {
    if frame.len() != geometry.buffer_size() {
        return Err(FrameError::InvalidLength {
            expected: geometry.buffer_size(),
            provided: frame.len(),
        });
    }

    let stride = geometry.bytes_per_row();
    let mut canvas = Canvas::new(geometry);
    for y in 0..u32::from(geometry.height) {
        let row = y as usize * stride;
        for x in 0..u32::from(geometry.width) {
            let byte = frame.as_bytes()[row + x as usize / 8];
            canvas.set(x, y, byte & (0x80 >> (x % 8)) == 0);
        }
    }
    Ok(canvas)
}
