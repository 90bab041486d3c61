//! Panel geometry, configuration and builder

pub use crate::error::BuilderError;

use crate::interface::DEFAULT_BUSY_TIMEOUT_MS;

/// Panel geometry in pixels
///
/// `width` runs along a row of the controller's RAM (source outputs) and
/// `height` counts rows (gate outputs). The width does not have to be a
/// multiple of 8; every packed row is padded up to the next byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Pixels per row
    pub width: u16,
    /// Number of rows
    pub height: u16,
}

impl Geometry {
    /// Waveshare 2.7" black/white/red panel (portrait, 176 x 264)
    pub const EPD_2IN7B: Self = Self {
        width: 176,
        height: 264,
    };

    /// Create a new geometry with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidGeometry` if either side is zero.
    pub fn new(width: u16, height: u16) -> Result<Self, BuilderError> {
        if width == 0 || height == 0 {
            return Err(BuilderError::InvalidGeometry { width, height });
        }
        Ok(Self { width, height })
    }

    /// Bytes per packed row, `ceil(width / 8)`
    pub fn bytes_per_row(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Size of one packed plane in bytes
    pub fn buffer_size(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }

    /// The same geometry with width and height swapped
    pub fn transposed(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Drawing rotation relative to the panel's native (portrait) orientation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation
    #[default]
    Rotate0,
    /// Rotate 90 degrees clockwise
    Rotate90,
    /// Rotate 180 degrees
    Rotate180,
    /// Rotate 270 degrees clockwise (landscape, connector on the left)
    Rotate270,
}

/// Panel configuration
///
/// Holds the geometry and every controller register value written during
/// the power-on sequence. Use [`Builder`] to create a Config; the defaults
/// match the Waveshare 2.7" (B) module.
#[derive(Clone, Debug)]
pub struct Config {
    /// Panel geometry
    pub geometry: Geometry,
    /// Drawing rotation
    pub rotation: Rotation,
    /// Panel setting byte (command 0x00)
    pub panel_setting: u8,
    /// PLL / frame rate byte (command 0x30)
    pub pll_control: u8,
    /// Power setting bytes (command 0x01)
    pub power_setting: [u8; 5],
    /// Booster soft-start bytes (command 0x06)
    pub booster_soft_start: [u8; 3],
    /// Vendor power optimization register/value pairs (command 0xF8)
    pub power_optimization: [(u8, u8); 7],
    /// VCOM DC byte (command 0x82)
    pub vcm_dc: u8,
    /// VCOM and data interval byte while awake (command 0x50)
    pub vcom_data_interval: u8,
    /// VCOM and data interval byte written before power off
    pub vcom_data_interval_sleep: u8,
    /// Invert every plane byte on the wire
    ///
    /// Packed frames use bit 1 = light. Panels whose LUT treats bit 1 as ink
    /// need the bytes inverted before transmission.
    pub invert_wire_data: bool,
    /// Timeout for every busy wait in milliseconds
    ///
    /// Always non-zero when built through [`Builder`].
    pub busy_timeout_ms: u32,
}

impl Config {
    /// Geometry of the drawing surface after rotation
    pub fn rotated_geometry(&self) -> Geometry {
        match self.rotation {
            Rotation::Rotate0 | Rotation::Rotate180 => self.geometry,
            Rotation::Rotate90 | Rotation::Rotate270 => self.geometry.transposed(),
        }
    }
}

/// Builder for constructing panel configuration
///
/// # Example
///
/// ```
/// use epd_weather::{Builder, Geometry, Rotation};
///
/// let config = Builder::new()
///     .geometry(Geometry::EPD_2IN7B)
///     .rotation(Rotation::Rotate270)
///     .busy_timeout_ms(20_000)
///     .build();
/// assert!(config.is_ok());
/// ```
#[must_use]
pub struct Builder {
    geometry: Option<Geometry>,
    rotation: Rotation,
    panel_setting: u8,
    pll_control: u8,
    power_setting: [u8; 5],
    booster_soft_start: [u8; 3],
    power_optimization: [(u8, u8); 7],
    vcm_dc: u8,
    vcom_data_interval: u8,
    vcom_data_interval_sleep: u8,
    invert_wire_data: bool,
    busy_timeout_ms: u32,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            geometry: None,
            rotation: Rotation::Rotate0,
            // KWR mode, LUT from OTP, scan up, shift right, booster on
            panel_setting: 0x8F,
            // 100 Hz
            pll_control: 0x3A,
            // VDS_EN | VDG_EN, VGHL 16V, VDH 11V, VDL -11V, VDHR 4.2V
            power_setting: [0x03, 0x00, 0x2B, 0x2B, 0x09],
            booster_soft_start: [0x07, 0x07, 0x17],
            power_optimization: [
                (0x60, 0xA5),
                (0x89, 0xA5),
                (0x90, 0x00),
                (0x93, 0x2A),
                (0xA0, 0xA5),
                (0xA1, 0x00),
                (0x73, 0x41),
            ],
            vcm_dc: 0x12,
            vcom_data_interval: 0x87,
            // Floating border, keeps the image while powered down
            vcom_data_interval_sleep: 0xF7,
            invert_wire_data: false,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set panel geometry (required)
    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set drawing rotation
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the panel setting byte
    pub fn panel_setting(mut self, value: u8) -> Self {
        self.panel_setting = value;
        self
    }

    /// Set the PLL control byte
    pub fn pll_control(mut self, value: u8) -> Self {
        self.pll_control = value;
        self
    }

    /// Set the power setting bytes
    pub fn power_setting(mut self, values: [u8; 5]) -> Self {
        self.power_setting = values;
        self
    }

    /// Set booster soft-start parameters
    pub fn booster_soft_start(mut self, values: [u8; 3]) -> Self {
        self.booster_soft_start = values;
        self
    }

    /// Set the power optimization register writes
    pub fn power_optimization(mut self, pairs: [(u8, u8); 7]) -> Self {
        self.power_optimization = pairs;
        self
    }

    /// Set VCOM DC value
    pub fn vcm_dc(mut self, value: u8) -> Self {
        self.vcm_dc = value;
        self
    }

    /// Set VCOM and data interval used while awake
    pub fn vcom_data_interval(mut self, value: u8) -> Self {
        self.vcom_data_interval = value;
        self
    }

    /// Set VCOM and data interval written before power off
    pub fn vcom_data_interval_sleep(mut self, value: u8) -> Self {
        self.vcom_data_interval_sleep = value;
        self
    }

    /// Invert plane bytes on the wire
    pub fn invert_wire_data(mut self, value: bool) -> Self {
        self.invert_wire_data = value;
        self
    }

    /// Set the busy-wait timeout in milliseconds
    ///
    /// Must be non-zero; every busy wait of the driver is bounded.
    pub fn busy_timeout_ms(mut self, value: u32) -> Self {
        self.busy_timeout_ms = value;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::MissingGeometry` if no geometry was set,
    /// `BuilderError::InvalidBusyTimeout` if the busy timeout is zero
    pub fn build(self) -> Result<Config, BuilderError> {
        if self.busy_timeout_ms == 0 {
            return Err(BuilderError::InvalidBusyTimeout);
        }
        Ok(Config {
            geometry: self.geometry.ok_or(BuilderError::MissingGeometry)?,
            rotation: self.rotation,
            panel_setting: self.panel_setting,
            pll_control: self.pll_control,
            power_setting: self.power_setting,
            booster_soft_start: self.booster_soft_start,
            power_optimization: self.power_optimization,
            vcm_dc: self.vcm_dc,
            vcom_data_interval: self.vcom_data_interval,
            vcom_data_interval_sleep: self.vcom_data_interval_sleep,
            invert_wire_data: self.invert_wire_data,
            busy_timeout_ms: self.busy_timeout_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_rejects_zero_sides() {
        assert!(matches!(
            Geometry::new(0, 10),
            Err(BuilderError::InvalidGeometry {
                width: 0,
                height: 10
            })
        ));
        assert!(Geometry::new(10, 0).is_err());
    }

    #[test]
    fn test_buffer_size_pads_rows() {
        let aligned = Geometry::new(16, 3).unwrap();
        assert_eq!(aligned.bytes_per_row(), 2);
        assert_eq!(aligned.buffer_size(), 6);

        let padded = Geometry::new(10, 3).unwrap();
        assert_eq!(padded.bytes_per_row(), 2);
        assert_eq!(padded.buffer_size(), 6);

        assert_eq!(Geometry::EPD_2IN7B.buffer_size(), 22 * 264);
    }

    #[test]
    fn test_build_without_geometry_fails() {
        assert!(matches!(
            Builder::new().build(),
            Err(BuilderError::MissingGeometry)
        ));
    }

    #[test]
    fn test_rotated_geometry_is_transposed_for_landscape() {
        let config = Builder::new()
            .geometry(Geometry::EPD_2IN7B)
            .rotation(Rotation::Rotate270)
            .build()
            .unwrap();
        assert_eq!(config.rotated_geometry(), Geometry::new(264, 176).unwrap());

        let config = Builder::new()
            .geometry(Geometry::EPD_2IN7B)
            .rotation(Rotation::Rotate180)
            .build()
            .unwrap();
        assert_eq!(config.rotated_geometry(), Geometry::EPD_2IN7B);
    }

    #[test]
    fn test_builder_overrides_defaults() {
        let config = Builder::new()
            .geometry(Geometry::EPD_2IN7B)
            .panel_setting(0xAF)
            .invert_wire_data(true)
            .busy_timeout_ms(5_000)
            .build()
            .unwrap();
        assert_eq!(config.panel_setting, 0xAF);
        assert!(config.invert_wire_data);
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.vcom_data_interval_sleep, 0xF7);
    }

    #[test]
    fn test_zero_busy_timeout_is_rejected() {
        let result = Builder::new()
            .geometry(Geometry::EPD_2IN7B)
            .busy_timeout_ms(0)
            .build();
        assert!(matches!(result, Err(BuilderError::InvalidBusyTimeout)));

        let config = Builder::new()
            .geometry(Geometry::EPD_2IN7B)
            .build()
            .unwrap();
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }
}
