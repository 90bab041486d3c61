//! Data sources for the station
//!
//! The HTTP clients for the weather provider and the home-automation hub
//! live outside this crate. They plug in through [`WeatherProvider`] and
//! [`SensorSource`] and hand back already-parsed values.

use alloc::format;
use alloc::string::String;
use core::fmt::Debug;

/// Unit of every temperature in an [`Observation`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemperatureUnit {
    /// Degrees Celsius
    #[default]
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
    /// Kelvin
    Kelvin,
}

impl TemperatureUnit {
    /// Suffix printed after a value, including the degree sign where used
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
            Self::Kelvin => "K",
        }
    }
}

/// Current temperature with the day's range
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TemperatureRange {
    /// Current temperature
    pub current: f32,
    /// Minimum
    pub min: f32,
    /// Maximum
    pub max: f32,
}

/// Wind at the observation site
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Wind {
    /// Speed in m/s
    pub speed: f32,
    /// Meteorological direction in degrees
    pub direction: u16,
}

/// One weather observation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observation {
    /// Location name
    pub location: String,
    /// Provider condition code, e.g. 800 for clear sky
    pub condition_code: u16,
    /// Detailed status text
    pub description: String,
    /// Temperatures
    pub temperature: TemperatureRange,
    /// Unit of `temperature`
    pub unit: TemperatureUnit,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Pressure in hPa
    pub pressure: u16,
    /// Cloud cover in percent
    pub clouds: u8,
    /// Wind
    pub wind: Wind,
    /// Rain volume of the last hour in mm, if any fell
    pub rain_1h: Option<f32>,
    /// Observation time, unix seconds
    pub observed_at: i64,
    /// Sunrise, unix seconds
    pub sunrise: i64,
    /// Sunset, unix seconds
    pub sunset: i64,
    /// Offset of local time from UTC in seconds
    pub utc_offset: i32,
}

impl core::fmt::Display for Observation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let unit = self.unit.suffix();
        write!(
            f,
            "{}: {} ({}), {:.1}{unit} (min {:.1}, max {:.1}), humidity {}%, pressure {} hPa, \
             clouds {}%, wind {:.1} m/s from {}°, ",
            self.location,
            self.description,
            self.condition_code,
            self.temperature.current,
            self.temperature.min,
            self.temperature.max,
            self.humidity,
            self.pressure,
            self.clouds,
            self.wind.speed,
            self.wind.direction,
        )?;
        match self.rain_1h {
            Some(mm) => write!(f, "rain {mm:.1} mm, ")?,
            None => write!(f, "rain none, ")?,
        }
        write!(
            f,
            "observed {}, sunrise {}, sunset {}",
            clock_24h(self.observed_at, self.utc_offset),
            clock_24h(self.sunrise, self.utc_offset),
            clock_24h(self.sunset, self.utc_offset)
        )
    }
}

/// Local wall-clock `(hour, minute)` of a unix timestamp
fn local_time(timestamp: i64, utc_offset: i32) -> (i64, i64) {
    let seconds = (timestamp + i64::from(utc_offset)).rem_euclid(86_400);
    (seconds / 3_600, seconds % 3_600 / 60)
}

/// Local wall-clock time as `hh:mm AM`
pub fn clock_12h(timestamp: i64, utc_offset: i32) -> String {
    let (hour, minute) = local_time(timestamp, utc_offset);
    let (hour, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{hour:02}:{minute:02} {meridiem}")
}

/// Local wall-clock time as `HH:MM`
pub fn clock_24h(timestamp: i64, utc_offset: i32) -> String {
    let (hour, minute) = local_time(timestamp, utc_offset);
    format!("{hour:02}:{minute:02}")
}

/// Weather provider client
pub trait WeatherProvider {
    /// Network or parse failure
    type Error: Debug;

    /// Fetch the current observation for a provider location id
    ///
    /// # Errors
    ///
    /// Returns the client's error; the station skips the cycle.
    fn observe(&mut self, location: u32) -> Result<Observation, Self::Error>;
}

/// Home-automation sensor client
pub trait SensorSource {
    /// Network or parse failure
    type Error: Debug;

    /// Current state string of a device, e.g. `"21.5"`
    ///
    /// # Errors
    ///
    /// Returns the client's error; the station skips the cycle.
    fn state(&mut self, device: &str) -> Result<String, Self::Error>;
}

/// Everything one refresh shows
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reading {
    /// Provider observation
    pub observation: Observation,
    /// Outside sensor state
    pub outside: String,
    /// Bedroom sensor state
    pub bedroom: String,
}
