//! Error types for the driver
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`FrameError`] - Canvas / packed frame dimension mismatches
//! - [`Error`] - Runtime errors of the panel driver
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level hardware communication errors
//!
//! ## Example
//!
//! ```
//! use epd_weather::{Builder, BuilderError, Geometry};
//!
//! // Missing geometry
//! let result = Builder::new().build();
//! assert!(matches!(result, Err(BuilderError::MissingGeometry)));
//!
//! // Invalid geometry
//! let result = Geometry::new(0, 264);
//! assert!(result.is_err());
//! ```

use crate::config::Geometry;
use crate::display::PanelState;
use crate::frame::Plane;
use crate::interface::DisplayInterface;

/// Errors that can occur when driving the panel
///
/// Generic over the interface type to preserve the specific error type.
#[derive(Debug)]
pub enum Error<I: DisplayInterface> {
    /// The control lines could not be brought to their idle levels
    ///
    /// Fatal: the bus is unavailable.
    HardwareInit(I::Error),
    /// The power-on sequence failed
    ///
    /// Wraps the transport error, including a busy-wait timeout. The panel is
    /// left `Uninitialized`; the caller decides whether to retry.
    Init(I::Error),
    /// Interface error (SPI/GPIO/busy timeout) outside the power-on sequence
    ///
    /// The panel is left `Uninitialized`.
    Interface(I::Error),
    /// A packed plane does not match the panel geometry
    ///
    /// Nothing was sent to the controller.
    InvalidFrameSize {
        /// Plane whose buffer was rejected
        plane: Plane,
        /// Required length in bytes
        expected: usize,
        /// Provided length in bytes
        provided: usize,
    },
    /// The operation is not valid in the current panel state
    ///
    /// Nothing was sent to the controller.
    InvalidState {
        /// Rejected operation
        operation: &'static str,
        /// State the driver was in
        state: PanelState,
    },
}

impl<I: DisplayInterface> Error<I> {
    /// Whether the error indicates a condition the next cycle cannot fix
    ///
    /// Bus failures and caller bugs are fatal. Busy timeouts and transport
    /// hiccups are not: a fresh `init` may recover the panel.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HardwareInit(_) | Self::InvalidFrameSize { .. } | Self::InvalidState { .. }
        )
    }
}

impl<I: DisplayInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::HardwareInit(e) => write!(f, "Hardware init failed: {e:?}"),
            Self::Init(e) => write!(f, "Panel init failed: {e:?}"),
            Self::Interface(e) => write!(f, "Interface error: {e:?}"),
            Self::InvalidFrameSize {
                plane,
                expected,
                provided,
            } => write!(
                f,
                "Invalid {plane:?} frame size: expected {expected} bytes, provided {provided}"
            ),
            Self::InvalidState { operation, state } => {
                write!(f, "Cannot {operation} while panel is {state:?}")
            }
        }
    }
}

impl<I: DisplayInterface + core::fmt::Debug> core::error::Error for Error<I> {}

/// Errors that can occur when building configuration
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// Geometry was not specified
    ///
    /// [`Builder::geometry()`](crate::config::Builder::geometry) must be called before building.
    MissingGeometry,
    /// Busy timeout of zero; busy waits must be bounded
    InvalidBusyTimeout,
    /// Invalid geometry provided
    InvalidGeometry {
        /// Requested width
        width: u16,
        /// Requested height
        height: u16,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingGeometry => write!(f, "Geometry must be specified"),
            Self::InvalidBusyTimeout => write!(f, "Busy timeout must be non-zero"),
            Self::InvalidGeometry { width, height } => {
                write!(f, "Invalid geometry {width}x{height} (both sides must be non-zero)")
            }
        }
    }
}

impl core::error::Error for BuilderError {}

/// Errors from the frame buffer packer
#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    /// Canvas dimensions differ from the target geometry
    InvalidFrameSize {
        /// Geometry the frame must have
        expected: Geometry,
        /// Geometry of the provided canvas
        provided: Geometry,
    },
    /// Packed byte count differs from the target geometry
    InvalidLength {
        /// Required length in bytes
        expected: usize,
        /// Provided length in bytes
        provided: usize,
    },
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidFrameSize { expected, provided } => write!(
                f,
                "Invalid frame size: expected {}x{}, provided {}x{}",
                expected.width, expected.height, provided.width, provided.height
            ),
            Self::InvalidLength { expected, provided } => write!(
                f,
                "Invalid frame length: expected {expected} bytes, provided {provided}"
            ),
        }
    }
}

impl core::error::Error for FrameError {}
