//! IL91874 E-Paper Weather Station
//!
//! A driver for the Waveshare 2.7" bi-color (black/white/red) e-paper panel,
//! 176x264 pixels, plus the weather station that draws on it.
//!
//! ## Features
//!
//! - `no_std` compatible (needs `alloc`)
//! - `embedded-hal` v1.0 support
//! - `embedded-graphics` integration (with `graphics` feature)
//! - Explicit panel lifecycle with state checks
//! - Scoped sessions that always release the control lines
//! - Rotation support
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::{Operation, SpiDevice};
//! use epd_weather::{Builder, Display, Geometry, Interface, Layers, Rotation};
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiDevice for MockSpi {
//! #     fn transaction(
//! #         &mut self,
//! #         _operations: &mut [Operation<'_, u8>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(true) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(false) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let spi = MockSpi;
//! # let dc = MockPin;
//! # let rst = MockPin;
//! # let busy = MockPin;
//! # let mut delay = MockDelay;
//! let interface = Interface::new(spi, dc, rst, busy);
//! let config = match Builder::new()
//!     .geometry(Geometry::EPD_2IN7B)
//!     .rotation(Rotation::Rotate270)
//!     .build()
//! {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let layers = Layers::new(config.geometry, config.rotation);
//! // ... draw with embedded-graphics ...
//! let planes = layers.pack();
//!
//! let mut display = Display::new(interface, config);
//! if let Ok(mut session) = display.session(&mut delay) {
//!     let _ = session.init();
//!     let _ = session.display(&planes);
//!     let _ = session.sleep();
//! }
//! ```

#![no_std]

extern crate alloc;

/// Color types for bi-color e-paper panels
pub mod color;
/// IL91874 command definitions
pub mod command;
/// Panel configuration types and builder
pub mod config;
/// Core display operations
pub mod display;
/// Error types for the driver
pub mod error;
/// Pixel canvases and the frame buffer packer
pub mod frame;
/// Weather condition glyphs
pub mod glyph;
/// Hardware interface abstraction
pub mod interface;
/// Coordinate rotation utilities
pub mod rotation;
/// Weather and sensor data sources
pub mod weather;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;
/// Weather layout (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod render;
/// Weather station loop (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod station;

pub use color::Color;
pub use config::{Builder, Config, Geometry, Rotation};
pub use display::{Display, PanelState, Planes, Session};
pub use error::{BuilderError, Error, FrameError};
pub use frame::{Canvas, PackedFrame, Plane};
pub use glyph::GlyphError;
pub use interface::InterfaceError;
pub use interface::{DEFAULT_BUSY_TIMEOUT_MS, DisplayInterface, Interface};
pub use weather::{
    Observation, Reading, SensorSource, TemperatureRange, TemperatureUnit, WeatherProvider, Wind,
};

#[cfg(feature = "graphics")]
pub use graphics::Layers;
#[cfg(feature = "graphics")]
pub use render::{Layout, UnitGlyph};
#[cfg(feature = "graphics")]
pub use station::{CancelToken, Cancelled, Station, StationConfig, StationError};
