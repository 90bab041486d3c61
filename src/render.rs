//! Weather layout
//!
//! Draws a [`Reading`] onto the landscape (264 x 176) surface at fixed
//! coordinates:
//!
//! ```text
//! (10,0)   Location                      [glyph]
//! (..,25)    description
//! (10,45)  Observed at: 07:05 PM
//! (10,80)  21.5°C         (150,80) 19.0°C
//! (20,110) Outside        (160,110) Bedroom
//! (20,150) min 12°          25° max
//! ```

use alloc::format;
use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        iso_8859_1::{FONT_7X13, FONT_9X15, FONT_10X20},
    },
    prelude::*,
    text::{Baseline, Text, renderer::TextRenderer},
};

use crate::color::Color;
use crate::glyph::{GlyphError, glyph_for};
use crate::graphics::Layers;
use crate::weather::{Reading, clock_12h};

/// Icon drawn after each sensor temperature in place of the unit suffix
#[derive(Clone, Copy, Debug)]
pub struct UnitGlyph {
    /// Icon font
    pub font: &'static MonoFont<'static>,
    /// Icon character, `'` (degrees Celsius) in Meteocons
    pub glyph: &'static str,
}

/// Fonts and colors of the layout
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    /// Location, temperatures, min/max
    pub title: &'static MonoFont<'static>,
    /// Description and sensor labels
    pub body: &'static MonoFont<'static>,
    /// Observation time
    pub small: &'static MonoFont<'static>,
    /// Condition glyph
    ///
    /// [`glyph_for`] returns Meteocons character ids, so this is expected to
    /// be a `MonoFont` whose glyph mapping holds the Meteocons icons. The
    /// default text font shows the ids themselves ("1", "Y", ...).
    pub glyph: &'static MonoFont<'static>,
    /// Color of the condition glyph
    pub glyph_color: Color,
    /// Unit icon after the sensor temperatures; `None` prints the unit
    /// suffix as text
    pub unit_glyph: Option<UnitGlyph>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            title: &FONT_10X20,
            body: &FONT_9X15,
            small: &FONT_7X13,
            glyph: &FONT_10X20,
            glyph_color: Color::Black,
            unit_glyph: None,
        }
    }
}

/// Gap between the glyph and the right edge
const RIGHT_MARGIN: i32 = 10;

/// Draw `reading` onto `layers`
///
/// The surface is cleared to white first.
///
/// # Errors
///
/// Returns `GlyphError::Missing` when the condition code has no glyph.
/// Nothing is drawn in that case.
pub fn compose(reading: &Reading, layers: &mut Layers, layout: &Layout) -> Result<(), GlyphError> {
    let observation = &reading.observation;
    let glyph = glyph_for(observation.condition_code)?;

    layers.clear(Color::White);
    let width = layers.size().width as i32;

    let title = MonoTextStyle::new(layout.title, Color::Black);
    let body = MonoTextStyle::new(layout.body, Color::Black);
    let small = MonoTextStyle::new(layout.small, Color::Black);
    let glyph_style = MonoTextStyle::new(layout.glyph, layout.glyph_color);

    let location_width = text_width(&title, &observation.location);
    let description_width = text_width(&body, &observation.description);
    draw(layers, &observation.location, Point::new(10, 0), title);
    draw(
        layers,
        &observation.description,
        Point::new((10 + location_width / 2 - description_width / 2).max(0), 25),
        body,
    );

    let glyph_width = text_width(&glyph_style, glyph);
    draw(
        layers,
        glyph,
        Point::new(width - glyph_width - RIGHT_MARGIN, 0),
        glyph_style,
    );

    let observed = format!(
        "Observed at: {}",
        clock_12h(observation.observed_at, observation.utc_offset)
    );
    draw(layers, &observed, Point::new(10, 45), small);

    let unit = observation.unit.suffix();
    for (value, x) in [(&reading.outside, 10), (&reading.bedroom, 150)] {
        draw_temperature(layers, value, unit, Point::new(x, 80), title, layout.unit_glyph);
    }
    draw(layers, "Outside", Point::new(20, 110), body);
    draw(layers, "Bedroom", Point::new(160, 110), body);

    let range = format!(
        "min {}°          {}° max",
        round_half_away(observation.temperature.min),
        round_half_away(observation.temperature.max)
    );
    draw(layers, &range, Point::new(20, 150), title);

    Ok(())
}

fn draw_temperature(
    layers: &mut Layers,
    value: &str,
    suffix: &str,
    at: Point,
    style: MonoTextStyle<'_, Color>,
    unit_glyph: Option<UnitGlyph>,
) {
    match unit_glyph {
        Some(icon) => {
            draw(layers, value, at, style);
            let icon_at = at + Point::new(text_width(&style, value), 0);
            draw(layers, icon.glyph, icon_at, MonoTextStyle::new(icon.font, Color::Black));
        }
        None => draw(layers, &format!("{value}{suffix}"), at, style),
    }
}

fn draw(layers: &mut Layers, text: &str, at: Point, style: MonoTextStyle<'_, Color>) {
    let _ = Text::with_baseline(text, at, style, Baseline::Top).draw(layers);
}

fn text_width(style: &MonoTextStyle<'_, Color>, text: &str) -> i32 {
    style
        .measure_string(text, Point::zero(), Baseline::Top)
        .bounding_box
        .size
        .width as i32
}

/// Round to the nearest integer, halves away from zero
fn round_half_away(value: f32) -> i32 {
    libm::roundf(value) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Geometry, Rotation};
    use crate::weather::{Observation, TemperatureRange};
    use alloc::string::ToString;

    fn reading(code: u16) -> Reading {
        Reading {
            observation: Observation {
                location: "Helsinki".to_string(),
                condition_code: code,
                description: "clear sky".to_string(),
                temperature: TemperatureRange {
                    current: 18.2,
                    min: 12.4,
                    max: 24.6,
                },
                observed_at: 1_700_000_000,
                ..Observation::default()
            },
            outside: "17.9".to_string(),
            bedroom: "21.0".to_string(),
        }
    }

    fn landscape() -> Layers {
        Layers::new(Geometry::EPD_2IN7B, Rotation::Rotate270)
    }

    #[test]
    fn test_compose_draws_black_text() {
        let mut layers = landscape();
        compose(&reading(800), &mut layers, &Layout::default()).unwrap();
        assert!(layers.black().dark_pixels() > 0);
        assert_eq!(layers.accent().dark_pixels(), 0);
    }

    #[test]
    fn test_compose_rejects_unknown_condition_without_drawing() {
        let mut layers = landscape();
        layers.clear(Color::Black);
        let result = compose(&reading(900), &mut layers, &Layout::default());
        assert_eq!(result, Err(GlyphError::Missing(900)));
        // Untouched: still fully black
        let full = usize::from(Geometry::EPD_2IN7B.width) * usize::from(Geometry::EPD_2IN7B.height);
        assert_eq!(layers.black().dark_pixels(), full);
    }

    #[test]
    fn test_accent_glyph_uses_red_plane() {
        let mut layers = landscape();
        let layout = Layout {
            glyph_color: Color::Red,
            ..Layout::default()
        };
        compose(&reading(804), &mut layers, &layout).unwrap();
        assert!(layers.accent().dark_pixels() > 0);
    }

    #[test]
    fn test_compose_clears_previous_content() {
        let mut layers = landscape();
        compose(&reading(800), &mut layers, &Layout::default()).unwrap();
        let first = layers.black().clone();
        compose(&reading(800), &mut layers, &Layout::default()).unwrap();
        assert_eq!(layers.black(), &first);
    }

    #[test]
    fn test_unit_glyph_is_drawn_right_after_the_value() {
        let mut plain = landscape();
        compose(&reading(800), &mut plain, &Layout::default()).unwrap();

        // Same font and text as the suffix: pixel-identical placement
        let mut same = landscape();
        let layout = Layout {
            unit_glyph: Some(UnitGlyph {
                font: &FONT_10X20,
                glyph: "°C",
            }),
            ..Layout::default()
        };
        compose(&reading(800), &mut same, &layout).unwrap();
        assert_eq!(same.black(), plain.black());

        let mut icon = landscape();
        let layout = Layout {
            unit_glyph: Some(UnitGlyph {
                font: &FONT_10X20,
                glyph: "'",
            }),
            ..Layout::default()
        };
        compose(&reading(800), &mut icon, &layout).unwrap();
        assert_ne!(icon.black(), plain.black());
    }

    #[test]
    fn test_round_half_away() {
        assert_eq!(round_half_away(12.4), 12);
        assert_eq!(round_half_away(24.6), 25);
        assert_eq!(round_half_away(2.5), 3);
        assert_eq!(round_half_away(-2.5), -3);
        assert_eq!(round_half_away(-0.4), 0);
        // Largest f32 below one half; adding 0.5 would round it up
        assert_eq!(round_half_away(0.499_999_97), 0);
        assert_eq!(round_half_away(-0.499_999_97), 0);
        assert_eq!(round_half_away(-12.5), -13);
    }
}
