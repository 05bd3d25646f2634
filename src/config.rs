//! Driver configuration.

use crate::command::{DEFAULT_ADDRESS, GasMode};

/// Timing gates, limits and measurement mode of the polling driver
///
/// [`Config::default`] matches the SFM3019 bring-up timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// I2C address of the sensor
    pub address: u8,
    /// Gas the sensor streams in
    pub gas_mode: GasMode,
    /// Wait after the soft reset, in ms
    pub reset_delay_ms: u32,
    /// Wait after stopping a running measurement, in ms
    pub stop_delay_ms: u32,
    /// Wait after starting continuous measurement, in ms
    pub start_delay_ms: u32,
    /// Wait after discarding the first frame, in ms
    pub first_sample_delay_ms: u32,
    /// Minimum interval between two steady-state reads, in ms
    pub poll_period_ms: u32,
    /// Consecutive bus failures that force a full restart; zero acts as one
    pub max_errors: u8,
    /// Check the CRC of each word of the settings reply
    pub verify_settings_crc: bool,
    /// Restart when no valid sample arrived for this long, in ms
    pub data_timeout_ms: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            gas_mode: GasMode::Air,
            reset_delay_ms: 10,
            stop_delay_ms: 40,
            start_delay_ms: 40,
            first_sample_delay_ms: 1,
            poll_period_ms: 10,
            max_errors: 10,
            verify_settings_crc: true,
            data_timeout_ms: None,
        }
    }
}

impl Config {
    /// Use a different I2C address
    #[must_use]
    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Stream in a different gas mode
    #[must_use]
    pub const fn with_gas_mode(mut self, gas_mode: GasMode) -> Self {
        self.gas_mode = gas_mode;
        self
    }

    /// Change the steady-state read interval
    #[must_use]
    pub const fn with_poll_period_ms(mut self, period: u32) -> Self {
        self.poll_period_ms = period;
        self
    }

    /// Change the number of consecutive failures tolerated before a restart
    ///
    /// A limit of zero is raised to one.
    #[must_use]
    pub const fn with_max_errors(mut self, max_errors: u8) -> Self {
        self.max_errors = if max_errors == 0 { 1 } else { max_errors };
        self
    }

    /// Enable or disable CRC checks on the settings reply
    #[must_use]
    pub const fn with_settings_crc(mut self, verify: bool) -> Self {
        self.verify_settings_crc = verify;
        self
    }

    /// Restart the sensor when it stops producing valid samples
    #[must_use]
    pub const fn with_data_timeout_ms(mut self, timeout: u32) -> Self {
        self.data_timeout_ms = Some(timeout);
        self
    }
}
