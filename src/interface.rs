//! Hardware interface abstraction
//!
//! This module provides the [`DisplayInterface`] trait and the [`Interface`]
//! struct for talking to the IL91874 controller over SPI.
//!
//! ## Hardware Requirements
//!
//! - SPI bus (MOSI + SCK); chip-select is owned by the [`SpiDevice`]
//! - 3 GPIO pins:
//!   - **DC**: Data/Command select (output)
//!   - **RST**: Reset (output, active low)
//!   - **BUSY**: Busy status (input, active low on the IL91874)
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::delay::DelayNs;
//! use epd_weather::{DisplayInterface, Interface};
//! # use core::convert::Infallible;
//! # use embedded_hal::digital::{InputPin, OutputPin};
//! # use embedded_hal::spi::{Operation, SpiDevice};
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
//! # let mut delay = MockDelay;
//! let mut interface = Interface::new(MockSpi, MockPin, MockPin, MockPin);
//!
//! let _ = interface.initialize();
//! interface.reset(&mut delay);
//! let _ = interface.send_command(0x04); // Power on
//! let _ = interface.wait_until_idle(&mut delay, 5_000);
//! interface.teardown();
//! ```

use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::command::BUSY_ACTIVE_HIGH;

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Default timeout for busy-wait in milliseconds
///
/// A black/white/red full refresh takes around 15 seconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 30_000;

/// Reset line timing in milliseconds: idle high, asserted low, post-release
const RESET_TIMING_MS: (u32, u32, u32) = (200, 5, 200);

/// Trait for the transport to the panel controller
///
/// This trait hides the specific bus in use so that the
/// [`Display`](crate::display::Display) works with any SPI + GPIO
/// implementation, or a test double.
///
/// Implementations are single-owner and not meant to be shared between
/// threads.
pub trait DisplayInterface {
    /// Error type for interface operations
    type Error: Debug;

    /// Bring the control lines to their idle levels
    ///
    /// Must be idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines cannot be driven.
    fn initialize(&mut self) -> InterfaceResult<(), Self::Error>;

    /// Perform hardware reset
    ///
    /// Asserts RST, holds it, releases it and waits for the controller to
    /// come back. Erases any pending command state in the controller.
    fn reset<D: DelayNs>(&mut self, delay: &mut D);

    /// Send a command byte to the controller (DC low)
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn send_command(&mut self, command: u8) -> InterfaceResult<(), Self::Error>;

    /// Send data bytes to the controller (DC high)
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn send_data(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error>;

    /// Poll the busy line until the controller is idle
    ///
    /// `timeout_ms == 0` waits forever. [`Display`](crate::Display) always
    /// passes the non-zero timeout enforced by [`Builder`](crate::Builder).
    ///
    /// # Errors
    ///
    /// Returns a timeout error if BUSY does not clear within `timeout_ms`.
    fn wait_until_idle<D: DelayNs>(
        &mut self,
        delay: &mut D,
        timeout_ms: u32,
    ) -> InterfaceResult<(), Self::Error>;

    /// Release the control lines
    ///
    /// Safe to call even if [`initialize`](Self::initialize) never ran.
    fn teardown(&mut self);
}

/// Errors that can occur at the interface level
///
/// Generic over SPI and GPIO error types.
#[derive(Debug)]
pub enum InterfaceError<SpiErr, PinErr> {
    /// SPI communication error
    Spi(SpiErr),
    /// GPIO pin error
    Pin(PinErr),
    /// Control lines could not be brought to idle
    HardwareInit(PinErr),
    /// Timeout waiting for busy pin
    Timeout,
}

impl<SpiErr, PinErr> InterfaceError<SpiErr, PinErr> {
    /// Whether this is a busy-wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl<SpiErr: Debug, PinErr: Debug> core::fmt::Display for InterfaceError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI error: {e:?}"),
            Self::Pin(e) => write!(f, "Pin error: {e:?}"),
            Self::HardwareInit(e) => write!(f, "Could not initialize control lines: {e:?}"),
            Self::Timeout => write!(f, "Timeout waiting for display"),
        }
    }
}

impl<SpiErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<SpiErr, PinErr> {}

/// Hardware interface implementation for the IL91874
///
/// Implements [`DisplayInterface`] for embedded-hal v1.0 SPI and GPIO traits.
///
/// ## Type Parameters
///
/// * `SPI` - SPI device implementing [`SpiDevice`]
/// * `DC` - Data/Command pin implementing [`OutputPin`]
/// * `RST` - Reset pin implementing [`OutputPin`]
/// * `BUSY` - Busy pin implementing [`InputPin`]
pub struct Interface<SPI, DC, RST, BUSY> {
    /// SPI device for communication
    spi: SPI,
    /// Data/Command select pin (low=command, high=data)
    dc: DC,
    /// Reset pin (active low)
    rst: RST,
    /// Busy pin
    busy: BUSY,
    /// Busy pin polarity (true = active high, false = active low)
    busy_active_high: bool,
}

impl<SPI, DC, RST, BUSY> Interface<SPI, DC, RST, BUSY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
{
    /// Create a new Interface
    ///
    /// The pins are not touched until [`DisplayInterface::initialize`].
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            busy_active_high: BUSY_ACTIVE_HIGH,
        }
    }

    /// Set busy pin polarity
    ///
    /// Default is active-low, as on the IL91874.
    pub fn set_busy_active_high(&mut self, active_high: bool) -> &mut Self {
        self.busy_active_high = active_high;
        self
    }

    /// Get busy pin polarity (true = active high)
    pub fn busy_active_high(&self) -> bool {
        self.busy_active_high
    }

    /// Give back the SPI device and pins
    pub fn release(self) -> (SPI, DC, RST, BUSY) {
        (self.spi, self.dc, self.rst, self.busy)
    }
}

impl<SPI, DC, RST, BUSY, PinErr> DisplayInterface for Interface<SPI, DC, RST, BUSY>
where
    SPI: SpiDevice,
    SPI::Error: Debug,
    DC: OutputPin<Error = PinErr>,
    RST: OutputPin<Error = PinErr>,
    BUSY: InputPin<Error = PinErr>,
    PinErr: Debug,
{
    type Error = InterfaceError<SPI::Error, PinErr>;

    fn initialize(&mut self) -> InterfaceResult<(), Self::Error> {
        self.rst.set_high().map_err(InterfaceError::HardwareInit)?;
        self.dc.set_high().map_err(InterfaceError::HardwareInit)?;
        Ok(())
    }

    fn reset<D: DelayNs>(&mut self, delay: &mut D) {
        let (idle, hold, settle) = RESET_TIMING_MS;
        let _ = self.rst.set_high();
        delay.delay_ms(idle);
        let _ = self.rst.set_low();
        delay.delay_ms(hold);
        let _ = self.rst.set_high();
        delay.delay_ms(settle);
    }

    fn send_command(&mut self, command: u8) -> InterfaceResult<(), Self::Error> {
        self.dc.set_low().map_err(InterfaceError::Pin)?;
        self.spi.write(&[command]).map_err(InterfaceError::Spi)?;
        Ok(())
    }

    fn send_data(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error> {
        self.dc.set_high().map_err(InterfaceError::Pin)?;
        self.spi.write(data).map_err(InterfaceError::Spi)?;
        Ok(())
    }

    fn wait_until_idle<D: DelayNs>(
        &mut self,
        delay: &mut D,
        timeout_ms: u32,
    ) -> InterfaceResult<(), Self::Error> {
        let mut iterations = 0u32;

        loop {
            let level = if self.busy_active_high {
                self.busy.is_high()
            } else {
                self.busy.is_low()
            };
            let is_busy = level.map_err(InterfaceError::Pin)?;

            if !is_busy {
                return Ok(());
            }

            delay.delay_ms(1);
            iterations += 1;
            if timeout_ms > 0 && iterations >= timeout_ms {
                log::warn!("busy line still asserted after {timeout_ms} ms");
                return Err(InterfaceError::Timeout);
            }
        }
    }

    fn teardown(&mut self) {
        if let Err(e) = self.rst.set_low() {
            log::warn!("teardown: could not release RST: {e:?}");
        }
        if let Err(e) = self.dc.set_low() {
            log::warn!("teardown: could not release DC: {e:?}");
        }
    }
}
