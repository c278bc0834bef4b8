//! Shared configuration for the controller, the pin map, and the web boundary.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use shake_table::config::{Config, PinConfig, TableConfig, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.table.min_step_interval_us, 100);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_table(TableConfig::default().with_max_travel_steps(20_000))
//!     .with_pins(PinConfig::default().with_enable(22))
//!     .with_web(WebConfig::default().with_port(8080));
//! ```

use heapless::String as HString;

/// Maximum length for config strings (device names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating on a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let mut end = s.len().min(MAX_SHORT_STRING);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let _ = hs.push_str(&s[..end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Controller timing and safety bounds
    pub table: TableConfig,
    /// Digital line assignment and polarity
    pub pins: PinConfig,
    /// Test signal generation
    pub waveform: WaveformConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set controller configuration
    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.table = table;
        self
    }

    /// Set pin configuration
    pub fn with_pins(mut self, pins: PinConfig) -> Self {
        self.pins = pins;
        self
    }

    /// Set waveform configuration
    pub fn with_waveform(mut self, waveform: WaveformConfig) -> Self {
        self.waveform = waveform;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }
}

// ============================================================================
// Table Config
// ============================================================================

/// Controller configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableConfig {
    /// Pause after every homing/centering step, in microseconds
    pub min_step_interval_us: u32,
    /// Give up homing or travel measurement after this many steps.
    ///
    /// `None` waits for the sensor indefinitely.
    pub max_travel_steps: Option<u32>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_step_interval_us: 100,
            max_travel_steps: None,
        }
    }
}

impl TableConfig {
    /// Set the homing/centering step interval
    pub fn with_min_step_interval_us(mut self, us: u32) -> Self {
        self.min_step_interval_us = us;
        self
    }

    /// Bound homing and travel measurement
    pub fn with_max_travel_steps(mut self, steps: u32) -> Self {
        self.max_travel_steps = Some(steps);
        self
    }

    /// Wait for sensors indefinitely
    pub fn without_travel_limit(mut self) -> Self {
        self.max_travel_steps = None;
        self
    }
}

// ============================================================================
// Pin Config
// ============================================================================

/// Digital line assignment (BCM numbering) and polarity
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinConfig {
    /// Enable/pulse output
    pub enable: u8,
    /// Direction output
    pub direction: u8,
    /// Far limit sensor input
    pub far_sensor: u8,
    /// Near limit sensor input
    pub near_sensor: u8,
    /// Sensors read low when pressed
    pub sensor_active_low: bool,
    /// Direction line level that moves the carriage away from the motor
    pub away_level_high: bool,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            enable: 17,
            direction: 27,
            far_sensor: 19,
            near_sensor: 26,
            sensor_active_low: true,
            away_level_high: false,
        }
    }
}

impl PinConfig {
    /// Set the enable pin
    pub fn with_enable(mut self, pin: u8) -> Self {
        self.enable = pin;
        self
    }

    /// Set the direction pin
    pub fn with_direction(mut self, pin: u8) -> Self {
        self.direction = pin;
        self
    }

    /// Set both sensor pins
    pub fn with_sensors(mut self, near: u8, far: u8) -> Self {
        self.near_sensor = near;
        self.far_sensor = far;
        self
    }

    /// Set sensor polarity
    pub fn with_sensor_active_low(mut self, active_low: bool) -> Self {
        self.sensor_active_low = active_low;
        self
    }

    /// Set direction line polarity
    pub fn with_away_level_high(mut self, high: bool) -> Self {
        self.away_level_high = high;
        self
    }
}

// ============================================================================
// Waveform Config
// ============================================================================

/// Test signal configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaveformConfig {
    /// Samples per second for generated signals
    pub sampling_rate_hz: u32,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 10_000,
        }
    }
}

impl WaveformConfig {
    /// Set the sampling rate
    pub fn with_sampling_rate_hz(mut self, hz: u32) -> Self {
        self.sampling_rate_hz = hz;
        self
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 80,
            cors_permissive: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("shake-table"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
