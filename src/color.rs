//! Colors for the black/white/red panel
//!
//! Each pixel is one bit in the black plane and one bit in the accent plane.
//! After packing, a set bit means "no ink".
//!
//! | Color | Black plane | Accent plane |
//! |-------|-------------|--------------|
//! | Black | dark        | light        |
//! | White | light       | light        |
//! | Red   | light       | dark         |
//!
//! ## Example
//!
//! ```
//! use epd_weather::Color;
//!
//! assert_eq!(Color::Black.planes(), (true, false));
//! assert_eq!(Color::Red.planes(), (false, true));
//! ```

/// Colors supported by the panel
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Color {
    /// Black ink
    Black,
    /// No ink
    #[default]
    White,
    /// Red ink
    Red,
}

#[cfg(feature = "graphics")]
impl embedded_graphics_core::prelude::PixelColor for Color {
    type Raw = embedded_graphics_core::pixelcolor::raw::RawU8;
}

impl Color {
    /// Canvas values as `(black plane dark, accent plane dark)`
    pub fn planes(self) -> (bool, bool) {
        match self {
            Self::Black => (true, false),
            Self::White => (false, false),
            Self::Red => (false, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_leaves_both_planes_light() {
        assert_eq!(Color::White.planes(), (false, false));
        assert_eq!(Color::default(), Color::White);
    }

    #[test]
    fn test_red_only_inks_accent_plane() {
        assert_eq!(Color::Red.planes(), (false, true));
        assert_eq!(Color::Black.planes(), (true, false));
    }
}
