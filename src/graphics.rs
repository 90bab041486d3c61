//! Graphics support via embedded-graphics
//!
//! [`Layers`] is a two-plane drawing surface (black + red accent) that
//! implements [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget).
//! Drawing happens in rotated (logical) coordinates; the planes are stored in
//! the panel's physical orientation so they can be packed as they are.
//!
//! ## Example
//!
//! ```rust
//! use embedded_graphics::{
//!     mono_font::{ascii::FONT_6X10, MonoTextStyle},
//!     prelude::*,
//!     primitives::{PrimitiveStyle, Rectangle},
//!     text::Text,
//! };
//! use epd_weather::{Color, Geometry, Layers, Rotation};
//!
//! let mut layers = Layers::new(Geometry::EPD_2IN7B, Rotation::Rotate270);
//! assert_eq!(layers.size(), Size::new(264, 176));
//!
//! let _ = Rectangle::new(Point::new(10, 10), Size::new(50, 30))
//!     .into_styled(PrimitiveStyle::with_fill(Color::Red))
//!     .draw(&mut layers);
//!
//! let _ = Text::new(
//!     "Hello, E-Paper!",
//!     Point::new(10, 100),
//!     MonoTextStyle::new(&FONT_6X10, Color::Black),
//! )
//! .draw(&mut layers);
//!
//! let planes = layers.pack();
//! assert_eq!(planes.black.len(), Geometry::EPD_2IN7B.buffer_size());
//! ```

use core::convert::Infallible;
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    prelude::Pixel,
};

use crate::color::Color;
use crate::config::{Geometry, Rotation};
use crate::display::Planes;
use crate::frame::Canvas;
use crate::rotation::to_physical;

/// Two-plane drawing surface
pub struct Layers {
    /// Black/white plane, physical orientation
    black: Canvas,
    /// Red plane, physical orientation
    accent: Canvas,
    /// Logical to physical mapping
    rotation: Rotation,
}

impl Layers {
    /// Create an all-white surface for a panel of `geometry`
    pub fn new(geometry: Geometry, rotation: Rotation) -> Self {
        Self {
            black: Canvas::new(geometry),
            accent: Canvas::new(geometry),
            rotation,
        }
    }

    /// Fill the whole surface with `color`
    pub fn clear(&mut self, color: Color) {
        let (black, accent) = color.planes();
        self.black.fill(black);
        self.accent.fill(accent);
    }

    /// Physical panel geometry
    pub fn geometry(&self) -> Geometry {
        self.black.geometry()
    }

    /// Drawing rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Black plane canvas
    pub fn black(&self) -> &Canvas {
        &self.black
    }

    /// Accent plane canvas
    pub fn accent(&self) -> &Canvas {
        &self.accent
    }

    /// Pack both planes for [`Display::display`](crate::display::Display::display)
    pub fn pack(&self) -> Planes {
        Planes {
            black: self.black.pack(),
            accent: Some(self.accent.pack()),
        }
    }

    /// Set a single pixel in logical coordinates
    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let geometry = self.geometry();
        let (px, py) = to_physical(
            x,
            y,
            u32::from(geometry.width),
            u32::from(geometry.height),
            self.rotation,
        );
        let (black, accent) = color.planes();
        self.black.set(px, py, black);
        self.accent.set(px, py, accent);
    }
}

impl DrawTarget for Layers {
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let sz = self.size();

        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 {
                continue;
            }

            let x = x as u32;
            let y = y as u32;

            if x >= sz.width || y >= sz.height {
                continue;
            }

            self.set_pixel(x, y, color);
        }

        Ok(())
    }
}

impl OriginDimensions for Layers {
    fn size(&self) -> Size {
        let logical = match self.rotation {
            Rotation::Rotate0 | Rotation::Rotate180 => self.geometry(),
            Rotation::Rotate90 | Rotation::Rotate270 => self.geometry().transposed(),
        };
        Size::new(u32::from(logical.width), u32::from(logical.height))
    }
}
