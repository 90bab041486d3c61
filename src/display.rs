//! Core display operations
//!
//! [`Display`] owns the transport and sequences the controller through its
//! lifecycle:
//!
//! ```text
//! Uninitialized --init--> Awake --display--> Displaying --refresh done--> Awake
//!                           |  \--clear--> Awake
//!                           \--sleep--> Asleep --init--> Awake
//! ```
//!
//! `display`, `clear` and `sleep` are only accepted while `Awake`. A rejected
//! call sends nothing to the controller. Any transport failure after the
//! state check leaves the driver `Uninitialized`, because the controller
//! state is then unknown.

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::command::{
    BOOSTER_SOFT_START, DATA_STOP, DEEP_SLEEP, DEEP_SLEEP_CHECK, DISPLAY_REFRESH,
    PANEL_SETTING, PARTIAL_DISPLAY_REFRESH, PLL_CONTROL, POWER_OFF, POWER_ON,
    POWER_OPTIMIZATION, POWER_SETTING, TCON_RESOLUTION, VCM_DC_SETTING,
    VCOM_AND_DATA_INTERVAL_SETTING, plane_select,
};
use crate::config::{Config, Geometry};
use crate::error::Error;
use crate::frame::{PackedFrame, Plane};
use crate::interface::DisplayInterface;

type DisplayResult<I> = core::result::Result<(), Error<I>>;

/// Bytes per SPI write when streaming a fill value or inverted data
const CHUNK: usize = 64;

/// Lifecycle state of the panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelState {
    /// Not powered up, or controller state unknown after a failure
    #[default]
    Uninitialized,
    /// Powered and ready for frame transfers
    Awake,
    /// A refresh is running
    Displaying,
    /// Deep sleep; only `init` (which resets) wakes the panel
    Asleep,
}

/// Packed planes for one refresh
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Planes {
    /// Black/white plane
    pub black: PackedFrame,
    /// Red plane; `None` writes an all-light accent plane
    pub accent: Option<PackedFrame>,
}

impl Planes {
    /// Black plane only
    pub fn monochrome(black: PackedFrame) -> Self {
        Self {
            black,
            accent: None,
        }
    }

    fn get(&self, plane: Plane) -> Option<&PackedFrame> {
        match plane {
            Plane::Black => Some(&self.black),
            Plane::Accent => self.accent.as_ref(),
        }
    }
}

/// Panel driver for the IL91874
///
/// Single-owner; wrap it in a mutex if several threads must reach it.
pub struct Display<I>
where
    I: DisplayInterface,
{
    /// Hardware interface
    interface: I,
    /// Panel configuration
    config: Config,
    /// Lifecycle state
    state: PanelState,
}

impl<I> Display<I>
where
    I: DisplayInterface,
{
    /// Create a new Display instance
    ///
    /// Nothing is sent to the panel until [`init`](Self::init).
    pub fn new(interface: I, config: Config) -> Self {
        Self {
            interface,
            config,
            state: PanelState::Uninitialized,
        }
    }

    /// Reset and power up the controller
    ///
    /// Accepted in every state; this is also the only way out of `Asleep`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Init` if a write fails or a busy wait times out. The
    /// panel stays `Uninitialized` and no retry is attempted.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        debug!("panel init from {:?}", self.state);
        self.state = PanelState::Uninitialized;
        self.interface.reset(delay);
        self.power_on_sequence(delay).map_err(Error::Init)?;
        self.state = PanelState::Awake;
        Ok(())
    }

    fn power_on_sequence<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I::Error> {
        let timeout = self.config.busy_timeout_ms;

        self.interface.send_command(POWER_ON)?;
        self.interface.wait_until_idle(delay, timeout)?;

        self.command(PANEL_SETTING, &[self.config.panel_setting])?;
        self.command(PLL_CONTROL, &[self.config.pll_control])?;
        let power = self.config.power_setting;
        self.command(POWER_SETTING, &power)?;
        let booster = self.config.booster_soft_start;
        self.command(BOOSTER_SOFT_START, &booster)?;

        for (register, value) in self.config.power_optimization {
            self.command(POWER_OPTIMIZATION, &[register, value])?;
        }

        // Full refresh only
        self.command(PARTIAL_DISPLAY_REFRESH, &[0x00])?;

        let Geometry { width, height } = self.config.geometry;
        let [w_hi, w_lo] = width.to_be_bytes();
        let [h_hi, h_lo] = height.to_be_bytes();
        self.command(TCON_RESOLUTION, &[w_hi, w_lo, h_hi, h_lo])?;

        self.command(VCM_DC_SETTING, &[self.config.vcm_dc])?;
        self.command(VCOM_AND_DATA_INTERVAL_SETTING, &[self.config.vcom_data_interval])?;

        self.interface.wait_until_idle(delay, timeout)
    }

    /// Write all-light frames to both planes and refresh
    ///
    /// Erases ghosting left by earlier images.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless `Awake`, `Error::Interface` on a
    /// transport failure or busy timeout.
    pub fn clear<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.require_awake("clear")?;
        debug!("clearing panel");
        let result = self.write_blank_planes(delay);
        self.settle(result, PanelState::Awake)
    }

    fn write_blank_planes<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I::Error> {
        let size = self.config.geometry.buffer_size();
        for plane in Plane::ALL {
            self.write_fill(plane, size)?;
        }
        self.refresh(delay)
    }

    /// Transfer both planes and run a full refresh
    ///
    /// Blocks until the controller reports the refresh as complete. The
    /// previous image is fully replaced.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless `Awake`
    /// - `Error::InvalidFrameSize` if a plane length differs from the
    ///   geometry; checked for every plane before the first byte is sent
    /// - `Error::Interface` on a transport failure or busy timeout
    pub fn display<D: DelayNs>(&mut self, planes: &Planes, delay: &mut D) -> DisplayResult<I> {
        self.require_awake("display")?;

        let expected = self.config.geometry.buffer_size();
        for plane in Plane::ALL {
            if let Some(frame) = planes.get(plane) {
                if frame.len() != expected {
                    return Err(Error::InvalidFrameSize {
                        plane,
                        expected,
                        provided: frame.len(),
                    });
                }
            }
        }

        debug!(
            "displaying frame ({} bytes per plane, accent: {})",
            expected,
            planes.accent.is_some()
        );
        let result = self.write_planes(planes, delay);
        self.settle(result, PanelState::Awake)
    }

    fn write_planes<D: DelayNs>(&mut self, planes: &Planes, delay: &mut D) -> Result<(), I::Error> {
        for plane in Plane::ALL {
            match planes.get(plane) {
                Some(frame) => self.write_plane(plane, frame.as_bytes())?,
                None => self.write_fill(plane, self.config.geometry.buffer_size())?,
            }
        }
        self.refresh(delay)
    }

    /// Power down and enter deep sleep
    ///
    /// The panel keeps its image without power.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless `Awake`, `Error::Interface` on a
    /// transport failure or busy timeout.
    pub fn sleep<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.require_awake("sleep")?;
        debug!("entering deep sleep");
        let result = self.power_down(delay);
        self.settle(result, PanelState::Asleep)
    }

    fn power_down<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I::Error> {
        self.command(
            VCOM_AND_DATA_INTERVAL_SETTING,
            &[self.config.vcom_data_interval_sleep],
        )?;
        self.interface.send_command(POWER_OFF)?;
        self.interface
            .wait_until_idle(delay, self.config.busy_timeout_ms)?;
        self.command(DEEP_SLEEP, &[DEEP_SLEEP_CHECK])
    }

    /// Bring the control lines up and return a guard that tears them down
    ///
    /// The returned [`Session`] drives the panel with `delay`. When it is
    /// dropped, on any exit path, an `Awake` panel is put to sleep and the
    /// interface is torn down.
    ///
    /// # Errors
    ///
    /// Returns `Error::HardwareInit` if the lines cannot be initialized; the
    /// interface is torn down before returning.
    pub fn session<'a, D: DelayNs>(
        &'a mut self,
        delay: &'a mut D,
    ) -> Result<Session<'a, I, D>, Error<I>> {
        if let Err(e) = self.interface.initialize() {
            self.interface.teardown();
            return Err(Error::HardwareInit(e));
        }
        Ok(Session {
            display: self,
            delay,
        })
    }

    fn refresh<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I::Error> {
        self.state = PanelState::Displaying;
        self.interface.send_command(DISPLAY_REFRESH)?;
        self.interface
            .wait_until_idle(delay, self.config.busy_timeout_ms)
    }

    fn write_plane(&mut self, plane: Plane, bytes: &[u8]) -> Result<(), I::Error> {
        trace!("{:?} plane: {} bytes", plane, bytes.len());
        self.interface.send_command(plane_select(plane))?;
        if self.config.invert_wire_data {
            let mut chunk = [0u8; CHUNK];
            for part in bytes.chunks(CHUNK) {
                for (out, byte) in chunk.iter_mut().zip(part) {
                    *out = !byte;
                }
                self.interface.send_data(&chunk[..part.len()])?;
            }
        } else {
            self.interface.send_data(bytes)?;
        }
        self.interface.send_command(DATA_STOP)
    }

    fn write_fill(&mut self, plane: Plane, len: usize) -> Result<(), I::Error> {
        trace!("{:?} plane: {} blank bytes", plane, len);
        let value = if self.config.invert_wire_data { 0x00 } else { 0xFF };
        let chunk = [value; CHUNK];
        self.interface.send_command(plane_select(plane))?;
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(CHUNK);
            self.interface.send_data(&chunk[..n])?;
            remaining -= n;
        }
        self.interface.send_command(DATA_STOP)
    }

    fn command(&mut self, command: u8, data: &[u8]) -> Result<(), I::Error> {
        self.interface.send_command(command)?;
        self.interface.send_data(data)
    }

    fn require_awake(&self, operation: &'static str) -> DisplayResult<I> {
        if self.state == PanelState::Awake {
            Ok(())
        } else {
            warn!("rejected {} while {:?}", operation, self.state);
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn settle(&mut self, result: Result<(), I::Error>, next: PanelState) -> DisplayResult<I> {
        match result {
            Ok(()) => {
                debug!("panel {:?} -> {:?}", self.state, next);
                self.state = next;
                Ok(())
            }
            Err(e) => {
                self.state = PanelState::Uninitialized;
                Err(Error::Interface(e))
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Panel geometry
    pub fn geometry(&self) -> Geometry {
        self.config.geometry
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Access the interface directly
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Give back the interface
    pub fn release(self) -> I {
        self.interface
    }
}

/// Scoped ownership of the panel's control lines
///
/// Created by [`Display::session`]. Dropping the session puts an `Awake`
/// panel to sleep (best effort) and always tears the interface down, so the
/// lines are released on early returns and unwinding alike.
pub struct Session<'a, I, D>
where
    I: DisplayInterface,
    D: DelayNs,
{
    display: &'a mut Display<I>,
    delay: &'a mut D,
}

impl<I, D> Session<'_, I, D>
where
    I: DisplayInterface,
    D: DelayNs,
{
    /// See [`Display::init`]
    pub fn init(&mut self) -> DisplayResult<I> {
        self.display.init(self.delay)
    }

    /// See [`Display::clear`]
    pub fn clear(&mut self) -> DisplayResult<I> {
        self.display.clear(self.delay)
    }

    /// See [`Display::display`]
    pub fn display(&mut self, planes: &Planes) -> DisplayResult<I> {
        self.display.display(planes, self.delay)
    }

    /// See [`Display::sleep`]
    pub fn sleep(&mut self) -> DisplayResult<I> {
        self.display.sleep(self.delay)
    }

    /// Current lifecycle state
    pub fn state(&self) -> PanelState {
        self.display.state()
    }
}

impl<I, D> Drop for Session<'_, I, D>
where
    I: DisplayInterface,
    D: DelayNs,
{
    fn drop(&mut self) {
        if self.display.state() == PanelState::Awake {
            if let Err(e) = self.display.sleep(self.delay) {
                warn!("could not put panel to sleep on release: {e}");
            }
        }
        self.display.interface.teardown();
        debug!("control lines released");
    }
}
