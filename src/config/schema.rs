//! Configuration schema definitions.
//!
//! Every section has serde defaults, so a partial file (or none at all) is
//! valid.

use super::error::{ConfigError, ConfigResult};
use crate::port::{BaudRate, DataBits};
use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Longest accepted read timeout, one day.
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Modem line settings
    pub modem: ModemConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Modem line settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Device node of the AT port
    pub device: String,
    /// Line speed; unsupported values fall back to 115200
    pub baud_rate: u32,
    /// Character width; unsupported values fall back to 8
    pub data_bits: u8,
    /// Read timeout in whole seconds
    pub timeout_secs: u64,
    /// Restart the read timeout whenever data arrives
    pub greedy_read: bool,
    /// Drain stale modem output when opening
    pub clear_modem_side_buffers: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB2".to_string(),
            baud_rate: 115200,
            data_bits: 8,
            timeout_secs: 3,
            greedy_read: false,
            clear_modem_side_buffers: false,
        }
    }
}

impl ModemConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate and build the session profile.
    pub fn to_profile(&self) -> ConfigResult<Profile> {
        if self.device.trim().is_empty() {
            return Err(ConfigError::invalid("modem.device", "must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "modem.timeout_secs",
                "must be at least 1 second",
            ));
        }
        if self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::invalid(
                "modem.timeout_secs",
                format!("must be at most {MAX_TIMEOUT_SECS} seconds"),
            ));
        }
        if BaudRate::from_u32(self.baud_rate).is_none() {
            warn!(
                "Unsupported baud rate {}, the port will use 115200",
                self.baud_rate
            );
        }
        if DataBits::from_bits(self.data_bits).is_none() {
            warn!(
                "Unsupported data bits {}, the port will use 8",
                self.data_bits
            );
        }

        Ok(Profile::new(&self.device)
            .with_baud_rate(self.baud_rate)
            .with_data_bits(self.data_bits)
            .with_timeout(self.timeout())
            .with_greedy_read(self.greedy_read)
            .with_clear_modem_side_buffers(self.clear_modem_side_buffers))
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line format with colors
    #[default]
    Pretty,
    /// One line per event
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.modem.device, "/dev/ttyUSB2");
        assert_eq!(config.modem.baud_rate, 115200);
        assert_eq!(config.modem.timeout_secs, 3);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[modem]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [modem]
            device = "/dev/ttyACM0"
            baud_rate = 9600
            greedy_read = true

            [logging]
            format = "compact"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.modem.device, "/dev/ttyACM0");
        assert_eq!(config.modem.baud_rate, 9600);
        assert!(config.modem.greedy_read);
        // Defaults should still work
        assert_eq!(config.modem.data_bits, 8);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_to_profile() {
        let modem = ModemConfig {
            device: "/dev/ttyUSB3".to_string(),
            baud_rate: 57600,
            data_bits: 7,
            timeout_secs: 5,
            greedy_read: true,
            clear_modem_side_buffers: true,
        };
        let profile = modem.to_profile().unwrap();
        assert_eq!(profile.device.to_str(), Some("/dev/ttyUSB3"));
        assert_eq!(profile.baud_rate, 57600);
        assert_eq!(profile.data_bits, 7);
        assert_eq!(profile.timeout, Duration::from_secs(5));
        assert!(profile.greedy_read);
        assert!(profile.clear_modem_side_buffers);
    }

    #[test]
    fn test_to_profile_validation() {
        let modem = ModemConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            modem.to_profile(),
            Err(ConfigError::Invalid { key: "modem.timeout_secs", .. })
        ));

        let modem = ModemConfig {
            timeout_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            modem.to_profile(),
            Err(ConfigError::Invalid { key: "modem.timeout_secs", .. })
        ));

        let modem = ModemConfig {
            timeout_secs: MAX_TIMEOUT_SECS,
            ..Default::default()
        };
        assert!(modem.to_profile().is_ok());

        let modem = ModemConfig {
            device: "  ".to_string(),
            ..Default::default()
        };
        assert!(modem.to_profile().is_err());
    }

    #[test]
    fn test_unsupported_line_values_are_kept() {
        let modem = ModemConfig {
            baud_rate: 1200,
            data_bits: 9,
            ..Default::default()
        };
        let profile = modem.to_profile().unwrap();
        assert_eq!(profile.baud_rate, 1200);
        assert_eq!(profile.effective_baud_rate(), BaudRate::B115200);
        assert_eq!(profile.effective_data_bits(), DataBits::Eight);
    }
}
