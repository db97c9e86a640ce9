//! Configuration for the RTD-W bridge.

use rtdw_common::{DEFAULT_KEY_PREFIX, Format, LoggingConfig, ZenohConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtdwBridgeConfig {
    /// Zenoh connection settings
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// RTD-W interface settings
    #[serde(default)]
    pub rtdw: RtdwConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// RTD-W interface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtdwConfig {
    /// Key expression prefix (default: "zensight/rtdw")
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Device name (used in key expressions)
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub poll: PollConfig,

    /// Force debug logging
    #[serde(default)]
    pub debug: bool,

    /// Payload encoding for published samples
    #[serde(default)]
    pub format: Format,
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_device() -> String {
    "altherma".to_string()
}

impl Default for RtdwConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            device: default_device(),
            serial: SerialConfig::default(),
            poll: PollConfig::default(),
            debug: false,
            format: Format::default(),
        }
    }
}

/// Serial line settings (always 8N1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB1")
    #[serde(default = "default_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Modbus slave address (1-247)
    #[serde(default = "default_slave")]
    pub slave: u8,

    /// Per-transaction timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_port() -> String {
    "/dev/ttyUSB1".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_slave() -> u8 {
    1
}

fn default_timeout() -> u64 {
    1000
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            slave: default_slave(),
            timeout_ms: default_timeout(),
        }
    }
}

/// Polling schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Minutes between two scans
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// Heartbeat period in seconds
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u32,
}

fn default_interval_minutes() -> u32 {
    1
}

fn default_heartbeat_secs() -> u32 {
    10
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

impl PollConfig {
    /// Heartbeats between two scans, rounded up.
    pub fn ticks_per_poll(&self) -> u32 {
        let heartbeat = self.heartbeat_secs.max(1);
        (self.interval_minutes.saturating_mul(60))
            .div_ceil(heartbeat)
            .max(1)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(u64::from(self.heartbeat_secs))
    }
}

impl RtdwBridgeConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: RtdwBridgeConfig = json5::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rtdw = &self.rtdw;

        if rtdw.device.is_empty() {
            return Err(ConfigError::Validation(
                "Device name cannot be empty".to_string(),
            ));
        }

        if rtdw.key_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "key_prefix cannot be empty".to_string(),
            ));
        }

        if rtdw.serial.port.is_empty() {
            return Err(ConfigError::Validation(
                "Serial port cannot be empty".to_string(),
            ));
        }

        if rtdw.serial.baud_rate == 0 {
            return Err(ConfigError::Validation(
                "baud_rate must be greater than 0".to_string(),
            ));
        }

        if !(1..=247).contains(&rtdw.serial.slave) {
            return Err(ConfigError::Validation(format!(
                "slave must be 1-247, got {}",
                rtdw.serial.slave
            )));
        }

        if rtdw.serial.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }

        if rtdw.poll.interval_minutes == 0 || rtdw.poll.heartbeat_secs == 0 {
            return Err(ConfigError::Validation(
                "interval_minutes and heartbeat_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: RtdwBridgeConfig = json5::from_str("{}").unwrap();
        config.validate().unwrap();

        assert_eq!(config.rtdw.key_prefix, "zensight/rtdw");
        assert_eq!(config.rtdw.device, "altherma");
        assert_eq!(config.rtdw.serial, SerialConfig::default());
        assert_eq!(config.rtdw.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.rtdw.serial.baud_rate, 9600);
        assert_eq!(config.rtdw.serial.slave, 1);
        assert_eq!(config.rtdw.poll.ticks_per_poll(), 6);
        assert_eq!(config.rtdw.poll.heartbeat(), Duration::from_secs(10));
        assert!(!config.rtdw.debug);
        assert_eq!(config.rtdw.format, Format::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            zenoh: { mode: "client", connect: ["tcp/10.0.0.2:7447"] },
            rtdw: {
                device: "hydrobox",
                serial: { port: "/dev/ttyAMA0", baud_rate: 19200, timeout_ms: 500 },
                poll: { interval_minutes: 5, heartbeat_secs: 10 },
                debug: true,
                format: "cbor",
            },
            logging: { level: "warn", format: "json" },
        }"#;

        let config: RtdwBridgeConfig = json5::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.zenoh.mode, "client");
        assert_eq!(config.rtdw.device, "hydrobox");
        assert_eq!(config.rtdw.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.rtdw.serial.baud_rate, 19200);
        assert_eq!(config.rtdw.serial.slave, 1);
        assert_eq!(config.rtdw.serial.timeout_ms, 500);
        assert_eq!(config.rtdw.poll.ticks_per_poll(), 30);
        assert!(config.rtdw.debug);
        assert_eq!(config.rtdw.format, Format::Cbor);
    }

    #[test]
    fn test_ticks_round_up() {
        let poll = PollConfig {
            interval_minutes: 1,
            heartbeat_secs: 7,
        };
        assert_eq!(poll.ticks_per_poll(), 9);

        let poll = PollConfig {
            interval_minutes: 1,
            heartbeat_secs: 120,
        };
        assert_eq!(poll.ticks_per_poll(), 1);
    }

    #[test]
    fn test_validate_slave() {
        let config: RtdwBridgeConfig =
            json5::from_str(r#"{ rtdw: { serial: { slave: 0 } } }"#).unwrap();
        assert!(config.validate().is_err());

        let config: RtdwBridgeConfig =
            json5::from_str(r#"{ rtdw: { serial: { slave: 248 } } }"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_fields() {
        let config: RtdwBridgeConfig = json5::from_str(r#"{ rtdw: { device: "" } }"#).unwrap();
        assert!(config.validate().is_err());

        let config: RtdwBridgeConfig =
            json5::from_str(r#"{ rtdw: { serial: { port: "" } } }"#).unwrap();
        assert!(config.validate().is_err());

        let config: RtdwBridgeConfig =
            json5::from_str(r#"{ rtdw: { serial: { baud_rate: 0 } } }"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_poll() {
        let config: RtdwBridgeConfig =
            json5::from_str(r#"{ rtdw: { poll: { heartbeat_secs: 0 } } }"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config: RtdwBridgeConfig =
            json5::from_str(r#"{ rtdw: { poll: { interval_minutes: 0 } } }"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_sample_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("rtdw.json5");
        let config = RtdwBridgeConfig::load_from_file(path).unwrap();

        assert_eq!(config.rtdw.device, "altherma");
        assert_eq!(config.rtdw.poll.ticks_per_poll(), 6);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RtdwBridgeConfig::load_from_file("/nonexistent/rtdw.json5");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
