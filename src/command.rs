//! IL91874 command definitions
//!
//! Command bytes for the IL91874 controller found on the 2.7" black/white/red
//! e-paper panel. Commands are sent over SPI with the DC pin low, payload
//! bytes with the DC pin high.
//!
//! ## Command Structure
//!
//! 1. Assert CS (handled by the [`SpiDevice`](embedded_hal::spi::SpiDevice))
//! 2. Set DC low (command mode)
//! 3. Send command byte
//! 4. Set DC high (data mode)
//! 5. Send data bytes (if any)
//! 6. Deassert CS
//!
//! The values in this module are a frozen table taken from the controller
//! datasheet. Do not change them without a matching change in hardware.

use crate::frame::Plane;

// Power and panel setup

/// Panel setting command (0x00)
///
/// Resolution, LUT source, black/white or black/white/red mode, scan direction.
/// Requires 1 byte.
pub const PANEL_SETTING: u8 = 0x00;

/// Power setting command (0x01)
///
/// Requires 5 bytes: VDS/VDG enable, VCOM/VGHL level, VDH, VDL, VDHR.
pub const POWER_SETTING: u8 = 0x01;

/// Power off command (0x02)
///
/// Turns off booster, regulators and VCOM. BUSY is asserted until done.
pub const POWER_OFF: u8 = 0x02;

/// Power on command (0x04)
///
/// Turns on booster, regulators and VCOM. BUSY is asserted until done.
pub const POWER_ON: u8 = 0x04;

/// Booster soft-start command (0x06)
///
/// Requires 3 bytes (phase A, B, C).
pub const BOOSTER_SOFT_START: u8 = 0x06;

/// Deep sleep command (0x07)
///
/// Requires the check byte [`DEEP_SLEEP_CHECK`]. Only a hardware reset wakes
/// the controller afterwards.
pub const DEEP_SLEEP: u8 = 0x07;

/// Check code that must follow [`DEEP_SLEEP`]
pub const DEEP_SLEEP_CHECK: u8 = 0xA5;

// Frame transfer

/// Data start transmission 1 (0x10)
///
/// Selects the black/white plane. Followed by `buffer_size()` bytes.
pub const DATA_START_TRANSMISSION_1: u8 = 0x10;

/// Data stop command (0x11)
///
/// Closes a data transmission.
pub const DATA_STOP: u8 = 0x11;

/// Display refresh command (0x12)
///
/// Starts a full refresh from both planes. BUSY is asserted until the
/// waveform has completed.
pub const DISPLAY_REFRESH: u8 = 0x12;

/// Data start transmission 2 (0x13)
///
/// Selects the red (accent) plane. Followed by `buffer_size()` bytes.
pub const DATA_START_TRANSMISSION_2: u8 = 0x13;

/// Partial display refresh command (0x16)
///
/// Requires 1 byte. Written as `0x00` during init to keep partial refresh off.
pub const PARTIAL_DISPLAY_REFRESH: u8 = 0x16;

// Timing and voltage

/// PLL control command (0x30)
///
/// Frame rate. Requires 1 byte (`0x3A` = 100 Hz).
pub const PLL_CONTROL: u8 = 0x30;

/// VCOM and data interval setting command (0x50)
///
/// Requires 1 byte. Border output and data polarity.
pub const VCOM_AND_DATA_INTERVAL_SETTING: u8 = 0x50;

/// Resolution setting command (0x61)
///
/// Requires 4 bytes: `[width MSB, width LSB, height MSB, height LSB]`.
pub const TCON_RESOLUTION: u8 = 0x61;

/// VCOM DC setting command (0x82)
///
/// Requires 1 byte.
pub const VCM_DC_SETTING: u8 = 0x82;

/// Power optimization command (0xF8)
///
/// Vendor register write. Requires 2 bytes: `[register, value]`.
pub const POWER_OPTIMIZATION: u8 = 0xF8;

/// Busy line polarity of the IL91874
///
/// The controller pulls BUSY low while it is working.
pub const BUSY_ACTIVE_HIGH: bool = false;

/// Data transmission command that selects `plane`
pub const fn plane_select(plane: Plane) -> u8 {
    match plane {
        Plane::Black => DATA_START_TRANSMISSION_1,
        Plane::Accent => DATA_START_TRANSMISSION_2,
    }
}
