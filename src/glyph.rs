//! Weather condition glyphs
//!
//! Maps OpenWeatherMap condition codes to Meteocons glyph ids. The table is
//! explicitly partial: codes it does not list are rejected instead of
//! rendering whatever character happens to be at that position.

/// Lookup failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphError {
    /// No glyph is defined for this condition code
    Missing(u16),
}

impl core::fmt::Display for GlyphError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Missing(code) => write!(f, "No glyph for condition code {code}"),
        }
    }
}

impl core::error::Error for GlyphError {}

const THUNDERSTORM: &str = "6";
const LIGHT_RAIN: &str = "7";
const RAIN: &str = "8";
const SNOW: &str = "V";
const HEAVY_SNOW: &str = "W";
const SLEET: &str = "X";
const MIST: &str = "M";
const CLEAR: &str = "1";
const FEW_CLOUDS: &str = "H";
const CLOUDS: &str = "N";
const OVERCAST: &str = "Y";

/// Glyph id for a condition code
///
/// # Errors
///
/// Returns `GlyphError::Missing` for codes outside the table.
///
/// # Example
///
/// ```
/// use epd_weather::glyph::{glyph_for, GlyphError};
///
/// assert_eq!(glyph_for(800), Ok("1"));
/// assert_eq!(glyph_for(900), Err(GlyphError::Missing(900)));
/// ```
pub fn glyph_for(code: u16) -> Result<&'static str, GlyphError> {
    let glyph = match code {
        200 | 201 | 202 | 210 | 211 | 212 | 221 | 230 | 231 | 232 => THUNDERSTORM,

        300 | 301 | 310 => LIGHT_RAIN,
        302 | 311 | 312 | 313 | 314 | 321 => RAIN,

        500 | 501 | 520 | 521 => LIGHT_RAIN,
        502 | 503 | 504 | 511 | 522 | 531 => RAIN,

        600 | 601 | 615 | 616 | 620 => SNOW,
        602 | 621 | 622 => HEAVY_SNOW,
        611 | 612 | 613 => SLEET,

        701 | 711 | 721 | 731 | 741 | 751 | 761 | 762 | 771 | 781 => MIST,

        800 => CLEAR,
        801 => FEW_CLOUDS,
        802 | 803 => CLOUDS,
        804 => OVERCAST,

        _ => return Err(GlyphError::Missing(code)),
    };
    Ok(glyph)
}
