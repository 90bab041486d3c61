//! Weather station loop
//!
//! One cycle fetches a [`Reading`], draws it, and pushes it to the panel
//! inside a [`Session`](crate::display::Session):
//!
//! ```text
//! fetch -> compose -> session -> init -> [clear] -> display -> sleep
//! ```
//!
//! A [`CancelToken`] is checked between those steps and while waiting for
//! the next cycle. Busy waits are never interrupted; the session guard puts
//! the panel to sleep and releases the lines on every exit path.

use alloc::string::String;
use core::fmt::Debug;
use core::sync::atomic::{AtomicBool, Ordering};
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::Rotation;
use crate::display::{Display, Planes};
use crate::error::Error;
use crate::glyph::GlyphError;
use crate::graphics::Layers;
use crate::interface::DisplayInterface;
use crate::render::{Layout, compose};
use crate::weather::{Reading, SensorSource, WeatherProvider};

/// Slice of the inter-cycle wait between cancellation checks
const POLL_SLICE_MS: u32 = 100;

/// Cooperative stop request, shareable between threads or with an ISR
#[derive(Debug, Default)]
pub struct CancelToken(AtomicBool);

impl CancelToken {
    /// New token, not cancelled
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Request a stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once a stop was requested
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A stop was requested
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

/// Station settings, already resolved by the caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationConfig {
    /// Weather provider location id
    pub location: u32,
    /// Sensor device id for the outside temperature
    pub outside_device: String,
    /// Sensor device id for the bedroom temperature
    pub bedroom_device: String,
    /// Blank the panel before each image to remove ghosting
    pub clear_before_display: bool,
    /// Time between cycles
    pub interval_ms: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            location: 0,
            outside_device: String::new(),
            bedroom_device: String::new(),
            clear_before_display: true,
            interval_ms: 600_000,
        }
    }
}

/// Reasons a cycle did not complete
#[derive(Debug)]
pub enum StationError<I: DisplayInterface, WE, SE> {
    /// Weather provider failed
    Weather(WE),
    /// Sensor source failed
    Sensor(SE),
    /// The condition code has no glyph
    Glyph(GlyphError),
    /// Panel driver failed
    Panel(Error<I>),
    /// Stop requested
    Cancelled,
}

impl<I: DisplayInterface, WE, SE> StationError<I, WE, SE> {
    /// Whether the loop must stop
    ///
    /// Only fatal panel errors qualify. Collaborator failures and missing
    /// glyphs skip one cycle.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Panel(e) => e.is_fatal(),
            _ => false,
        }
    }
}

impl<I: DisplayInterface, WE, SE> From<Error<I>> for StationError<I, WE, SE> {
    fn from(e: Error<I>) -> Self {
        Self::Panel(e)
    }
}

impl<I: DisplayInterface, WE, SE> From<GlyphError> for StationError<I, WE, SE> {
    fn from(e: GlyphError) -> Self {
        Self::Glyph(e)
    }
}

impl<I: DisplayInterface, WE, SE> From<Cancelled> for StationError<I, WE, SE> {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl<I: DisplayInterface, WE: Debug, SE: Debug> core::fmt::Display for StationError<I, WE, SE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Weather(e) => write!(f, "Weather provider failed: {e:?}"),
            Self::Sensor(e) => write!(f, "Sensor source failed: {e:?}"),
            Self::Glyph(e) => write!(f, "{e}"),
            Self::Panel(e) => write!(f, "{e}"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl<I, WE, SE> core::error::Error for StationError<I, WE, SE>
where
    I: DisplayInterface + Debug,
    WE: Debug,
    SE: Debug,
{
}

type StationResult<T, I, W, S> =
    Result<T, StationError<I, <W as WeatherProvider>::Error, <S as SensorSource>::Error>>;

/// Weather station: data sources plus the panel
pub struct Station<I, W, S>
where
    I: DisplayInterface,
    W: WeatherProvider,
    S: SensorSource,
{
    display: Display<I>,
    weather: W,
    sensors: S,
    config: StationConfig,
    layers: Layers,
    layout: Layout,
}

impl<I, W, S> Station<I, W, S>
where
    I: DisplayInterface,
    W: WeatherProvider,
    S: SensorSource,
{
    /// Create a station
    ///
    /// The layout is landscape. A `Rotate90`/`Rotate270` display
    /// [`Config`](crate::Config) is drawn as configured; a portrait rotation
    /// is replaced by `Rotate270`.
    pub fn new(display: Display<I>, weather: W, sensors: S, config: StationConfig) -> Self {
        let rotation = match display.config().rotation {
            rotation @ (Rotation::Rotate90 | Rotation::Rotate270) => rotation,
            rotation => {
                warn!("layout is landscape, drawing with Rotate270 instead of {rotation:?}");
                Rotation::Rotate270
            }
        };
        let layers = Layers::new(display.geometry(), rotation);
        Self {
            display,
            weather,
            sensors,
            config,
            layers,
            layout: Layout::default(),
        }
    }

    /// Replace the fonts and glyph color
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Query the provider and both sensors
    ///
    /// # Errors
    ///
    /// Returns `StationError::Weather` or `StationError::Sensor`.
    pub fn fetch(&mut self) -> StationResult<Reading, I, W, S> {
        let observation = self
            .weather
            .observe(self.config.location)
            .map_err(StationError::Weather)?;
        let outside = self
            .sensors
            .state(&self.config.outside_device)
            .map_err(StationError::Sensor)?;
        let bedroom = self
            .sensors
            .state(&self.config.bedroom_device)
            .map_err(StationError::Sensor)?;
        debug!("observation: {observation}");
        debug!("sensors: outside {outside}, bedroom {bedroom}");
        Ok(Reading {
            observation,
            outside,
            bedroom,
        })
    }

    /// Draw `reading` and pack both planes
    ///
    /// # Errors
    ///
    /// Returns `GlyphError::Missing` for an unmapped condition code.
    pub fn render(&mut self, reading: &Reading) -> Result<Planes, GlyphError> {
        compose(reading, &mut self.layers, &self.layout)?;
        Ok(self.layers.pack())
    }

    /// Run one complete refresh
    ///
    /// Once the panel session is open, the panel is put to sleep and the
    /// lines are released before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first failing step, or `StationError::Cancelled` when
    /// `cancel` fired between steps.
    pub fn run_cycle<D: DelayNs>(
        &mut self,
        delay: &mut D,
        cancel: &CancelToken,
    ) -> StationResult<(), I, W, S> {
        cancel.check()?;
        let reading = self.fetch()?;
        let planes = self.render(&reading)?;
        cancel.check()?;

        let mut session = self.display.session(delay)?;
        session.init()?;
        cancel.check()?;
        if self.config.clear_before_display {
            session.clear()?;
            cancel.check()?;
        }
        session.display(&planes)?;
        session.sleep()?;

        info!(
            "refreshed: {} {}, outside {}, bedroom {}",
            reading.observation.location,
            reading.observation.description,
            reading.outside,
            reading.bedroom
        );
        Ok(())
    }

    /// Refresh every `interval_ms` until `cancel` fires
    ///
    /// A failed cycle is logged and skipped; the next one starts from a
    /// fresh `init`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal panel error (see [`Error::is_fatal`]).
    /// Cancellation returns `Ok(())`.
    pub fn run<D: DelayNs>(
        &mut self,
        delay: &mut D,
        cancel: &CancelToken,
    ) -> StationResult<(), I, W, S> {
        info!("station started, interval {} ms", self.config.interval_ms);
        loop {
            match self.run_cycle(delay, cancel) {
                Ok(()) => {}
                Err(StationError::Cancelled) => break,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("cycle skipped: {e}"),
            }
            if Self::wait_interval(delay, self.config.interval_ms, cancel).is_err() {
                break;
            }
        }
        info!("station stopped");
        Ok(())
    }

    fn wait_interval<D: DelayNs>(
        delay: &mut D,
        interval_ms: u32,
        cancel: &CancelToken,
    ) -> Result<(), Cancelled> {
        let mut remaining = interval_ms;
        while remaining > 0 {
            cancel.check()?;
            let slice = remaining.min(POLL_SLICE_MS);
            delay.delay_ms(slice);
            remaining -= slice;
        }
        cancel.check()
    }

    /// The panel driver
    pub fn display(&self) -> &Display<I> {
        &self.display
    }

    /// The drawing surface of the last render
    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    /// Station settings
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Give back the driver and both data sources
    pub fn into_parts(self) -> (Display<I>, W, S) {
        (self.display, self.weather, self.sensors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{DEEP_SLEEP, DISPLAY_REFRESH, POWER_ON};
    use crate::config::{Builder, Geometry};
    use embedded_graphics_core::geometry::{OriginDimensions, Size};
    use crate::display::PanelState;
    use crate::weather::{Observation, TemperatureRange};
    use alloc::string::ToString;
    use alloc::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum MockError {
        Timeout,
        Bus,
    }

    #[derive(Debug, Default)]
    struct MockInterface {
        commands: Vec<u8>,
        initialized: usize,
        torn_down: usize,
        waits: usize,
        timeout_on_wait: Option<usize>,
        fail_initialize: bool,
        cancel_on_power_on: Option<&'static CancelToken>,
    }

    impl MockInterface {
        fn count(&self, command: u8) -> usize {
            self.commands.iter().filter(|c| **c == command).count()
        }
    }

    impl DisplayInterface for MockInterface {
        type Error = MockError;

        fn initialize(&mut self) -> Result<(), Self::Error> {
            if self.fail_initialize {
                return Err(MockError::Bus);
            }
            self.initialized += 1;
            Ok(())
        }

        fn reset<D: DelayNs>(&mut self, _delay: &mut D) {}

        fn send_command(&mut self, command: u8) -> Result<(), Self::Error> {
            self.commands.push(command);
            if command == POWER_ON {
                if let Some(token) = self.cancel_on_power_on {
                    token.cancel();
                }
            }
            Ok(())
        }

        fn send_data(&mut self, _data: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn wait_until_idle<D: DelayNs>(
            &mut self,
            _delay: &mut D,
            _timeout_ms: u32,
        ) -> Result<(), Self::Error> {
            self.waits += 1;
            if self.timeout_on_wait == Some(self.waits) {
                return Err(MockError::Timeout);
            }
            Ok(())
        }

        fn teardown(&mut self) {
            self.torn_down += 1;
        }
    }

    #[derive(Debug, Default)]
    struct MockWeather {
        calls: usize,
        code: u16,
        /// Calls (1-based) that fail
        fail_on: Vec<usize>,
        /// Cancel this token during the given call
        cancel_on: Option<(usize, &'static CancelToken)>,
    }

    impl WeatherProvider for MockWeather {
        type Error = &'static str;

        fn observe(&mut self, location: u32) -> Result<Observation, Self::Error> {
            self.calls += 1;
            if let Some((call, token)) = self.cancel_on {
                if call == self.calls {
                    token.cancel();
                }
            }
            if self.fail_on.contains(&self.calls) {
                return Err("connection refused");
            }
            Ok(Observation {
                location: (if location == 658_225 { "Helsinki" } else { "Elsewhere" }).to_string(),
                condition_code: self.code,
                description: "clear sky".to_string(),
                temperature: TemperatureRange {
                    current: 18.0,
                    min: 12.0,
                    max: 24.0,
                },
                ..Observation::default()
            })
        }
    }

    #[derive(Debug, Default)]
    struct MockSensors {
        queried: Vec<String>,
        fail: bool,
    }

    impl SensorSource for MockSensors {
        type Error = &'static str;

        fn state(&mut self, device: &str) -> Result<String, Self::Error> {
            self.queried.push(device.to_string());
            if self.fail {
                return Err("unavailable");
            }
            Ok("21.5".to_string())
        }
    }

    #[derive(Default)]
    struct MockDelay {
        total_ns: u64,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    fn station_config() -> StationConfig {
        StationConfig {
            location: 658_225,
            outside_device: "sensor.outside".to_string(),
            bedroom_device: "sensor.bedroom".to_string(),
            interval_ms: 250,
            ..StationConfig::default()
        }
    }

    fn station_with(
        interface: MockInterface,
        weather: MockWeather,
        config: StationConfig,
    ) -> Station<MockInterface, MockWeather, MockSensors> {
        let panel = Builder::new()
            .geometry(Geometry::EPD_2IN7B)
            .rotation(Rotation::Rotate270)
            .build()
            .unwrap();
        Station::new(
            Display::new(interface, panel),
            weather,
            MockSensors::default(),
            config,
        )
    }

    fn station() -> Station<MockInterface, MockWeather, MockSensors> {
        station_with(
            MockInterface::default(),
            MockWeather {
                code: 800,
                ..MockWeather::default()
            },
            station_config(),
        )
    }

    #[test]
    fn test_default_station_config() {
        let config = StationConfig::default();
        assert!(config.clear_before_display);
        assert_eq!(config.interval_ms, 600_000);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.check(), Ok(()));
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(Cancelled));
    }

    #[test]
    fn test_portrait_config_is_drawn_landscape() {
        for (configured, used) in [
            (Rotation::Rotate0, Rotation::Rotate270),
            (Rotation::Rotate180, Rotation::Rotate270),
            (Rotation::Rotate90, Rotation::Rotate90),
            (Rotation::Rotate270, Rotation::Rotate270),
        ] {
            let panel = Builder::new()
                .geometry(Geometry::EPD_2IN7B)
                .rotation(configured)
                .build()
                .unwrap();
            let station = Station::new(
                Display::new(MockInterface::default(), panel),
                MockWeather::default(),
                MockSensors::default(),
                station_config(),
            );
            assert_eq!(station.layers().rotation(), used);
            assert_eq!(station.layers().size(), Size::new(264, 176));
        }
    }

    #[test]
    fn test_fetch_queries_both_sensors() {
        let mut station = station();
        let reading = station.fetch().unwrap();
        assert_eq!(reading.observation.location, "Helsinki");
        assert_eq!(reading.outside, "21.5");
        assert_eq!(reading.bedroom, "21.5");

        let (_, _, sensors) = station.into_parts();
        assert_eq!(sensors.queried, ["sensor.outside", "sensor.bedroom"]);
    }

    #[test]
    fn test_render_packs_full_planes() {
        let mut station = station();
        let reading = station.fetch().unwrap();
        let planes = station.render(&reading).unwrap();
        assert_eq!(planes.black.len(), Geometry::EPD_2IN7B.buffer_size());
        assert!(planes.accent.is_some());
        assert!(station.layers().black().dark_pixels() > 0);
    }

    #[test]
    fn test_cycle_clears_displays_and_sleeps() {
        let mut station = station();
        station
            .run_cycle(&mut MockDelay::default(), &CancelToken::new())
            .unwrap();
        assert_eq!(station.display().state(), PanelState::Asleep);

        let interface = station.into_parts().0.release();
        assert_eq!(interface.initialized, 1);
        assert_eq!(interface.torn_down, 1);
        // Clear and image
        assert_eq!(interface.count(DISPLAY_REFRESH), 2);
        assert_eq!(interface.count(DEEP_SLEEP), 1);
        assert_eq!(interface.commands.last(), Some(&DEEP_SLEEP));
    }

    #[test]
    fn test_cycle_without_clear_refreshes_once() {
        let config = StationConfig {
            clear_before_display: false,
            ..station_config()
        };
        let weather = MockWeather {
            code: 800,
            ..MockWeather::default()
        };
        let mut station = station_with(MockInterface::default(), weather, config);
        station
            .run_cycle(&mut MockDelay::default(), &CancelToken::new())
            .unwrap();

        let interface = station.into_parts().0.release();
        assert_eq!(interface.count(DISPLAY_REFRESH), 1);
    }

    #[test]
    fn test_weather_failure_leaves_panel_alone() {
        let weather = MockWeather {
            code: 800,
            fail_on: alloc::vec![1],
            ..MockWeather::default()
        };
        let mut station = station_with(MockInterface::default(), weather, station_config());
        let result = station.run_cycle(&mut MockDelay::default(), &CancelToken::new());
        assert!(matches!(result, Err(StationError::Weather("connection refused"))));
        assert!(!result.unwrap_err().is_fatal());

        let interface = station.into_parts().0.release();
        assert_eq!(interface.initialized, 0);
        assert!(interface.commands.is_empty());
    }

    #[test]
    fn test_sensor_failure_skips_cycle() {
        let panel = Builder::new()
            .geometry(Geometry::EPD_2IN7B)
            .build()
            .unwrap();
        let mut station = Station::new(
            Display::new(MockInterface::default(), panel),
            MockWeather {
                code: 800,
                ..MockWeather::default()
            },
            MockSensors {
                fail: true,
                ..MockSensors::default()
            },
            station_config(),
        );
        let result = station.run_cycle(&mut MockDelay::default(), &CancelToken::new());
        assert!(matches!(result, Err(StationError::Sensor("unavailable"))));
    }

    #[test]
    fn test_unknown_condition_is_glyph_error() {
        let weather = MockWeather {
            code: 900,
            ..MockWeather::default()
        };
        let mut station = station_with(MockInterface::default(), weather, station_config());
        let result = station.run_cycle(&mut MockDelay::default(), &CancelToken::new());
        assert!(matches!(
            result,
            Err(StationError::Glyph(GlyphError::Missing(900)))
        ));

        let interface = station.into_parts().0.release();
        assert!(interface.commands.is_empty());
    }

    #[test]
    fn test_cancelled_before_start_does_nothing() {
        let mut station = station();
        let token = CancelToken::new();
        token.cancel();
        let result = station.run_cycle(&mut MockDelay::default(), &token);
        assert!(matches!(result, Err(StationError::Cancelled)));

        let (display, weather, _) = station.into_parts();
        assert_eq!(weather.calls, 0);
        assert_eq!(display.release().initialized, 0);
    }

    #[test]
    fn test_cancel_after_init_still_sleeps_and_tears_down() {
        static TOKEN: CancelToken = CancelToken::new();
        let interface = MockInterface {
            cancel_on_power_on: Some(&TOKEN),
            ..MockInterface::default()
        };
        let weather = MockWeather {
            code: 800,
            ..MockWeather::default()
        };
        let mut station = station_with(interface, weather, station_config());

        let result = station.run_cycle(&mut MockDelay::default(), &TOKEN);
        assert!(matches!(result, Err(StationError::Cancelled)));
        assert_eq!(station.display().state(), PanelState::Asleep);

        let interface = station.into_parts().0.release();
        assert_eq!(interface.count(DISPLAY_REFRESH), 0);
        assert_eq!(interface.commands.last(), Some(&DEEP_SLEEP));
        assert_eq!(interface.torn_down, 1);
    }

    #[test]
    fn test_refresh_timeout_tears_down() {
        // Waits 1 and 2 belong to init, 3 is the clear refresh
        let interface = MockInterface {
            timeout_on_wait: Some(3),
            ..MockInterface::default()
        };
        let weather = MockWeather {
            code: 800,
            ..MockWeather::default()
        };
        let mut station = station_with(interface, weather, station_config());
        let result = station.run_cycle(&mut MockDelay::default(), &CancelToken::new());

        assert!(matches!(
            result,
            Err(StationError::Panel(Error::Interface(MockError::Timeout)))
        ));
        assert!(!result.unwrap_err().is_fatal());
        assert_eq!(station.display().state(), PanelState::Uninitialized);

        let interface = station.into_parts().0.release();
        assert_eq!(interface.count(DEEP_SLEEP), 0);
        assert_eq!(interface.torn_down, 1);
    }

    #[test]
    fn test_run_skips_failed_cycle_and_stops_on_cancel() {
        static TOKEN: CancelToken = CancelToken::new();
        let weather = MockWeather {
            code: 800,
            fail_on: alloc::vec![1],
            cancel_on: Some((3, &TOKEN)),
            ..MockWeather::default()
        };
        let mut station = station_with(MockInterface::default(), weather, station_config());
        let mut delay = MockDelay::default();

        station.run(&mut delay, &TOKEN).unwrap();

        // Two full intervals waited, after cycles 1 and 2
        assert_eq!(delay.total_ns, 2 * 250 * 1_000_000);
        let (display, weather, _) = station.into_parts();
        assert_eq!(weather.calls, 3);
        // Only cycle 2 reached the panel
        assert_eq!(display.release().initialized, 1);
    }

    #[test]
    fn test_run_returns_fatal_panel_error() {
        let interface = MockInterface {
            fail_initialize: true,
            ..MockInterface::default()
        };
        let weather = MockWeather {
            code: 800,
            ..MockWeather::default()
        };
        let mut station = station_with(interface, weather, station_config());
        let result = station.run(&mut MockDelay::default(), &CancelToken::new());

        assert!(matches!(
            result,
            Err(StationError::Panel(Error::HardwareInit(MockError::Bus)))
        ));
        let (display, weather, _) = station.into_parts();
        assert_eq!(weather.calls, 1);
        assert_eq!(display.release().torn_down, 1);
    }
}
