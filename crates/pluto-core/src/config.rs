//! Startup configuration
//!
//! Loaded once from JSON (on-flash blob or a file in the simulator) and
//! immutable afterwards. Every section and field is optional; missing
//! values fall back to the device defaults below.

use core::fmt;

use embassy_time::Duration;
use serde::Deserialize;
use thiserror_no_std::Error;

use crate::connection::{ReconnectPolicy, SupervisorSettings};
use crate::display::ScreenTimings;
use crate::scheduler::SchedulerSettings;

/// Capacity of the owned host and path strings in an [`Endpoint`]
pub const ENDPOINT_FIELD_CAPACITY: usize = 64;

pub const DEFAULT_BACKEND_HOST: &str = "192.168.1.208";
pub const DEFAULT_BACKEND_PORT: u16 = 8000;
pub const DEFAULT_BACKEND_PATH: &str = "/ws/telemetry";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse failed: {0}")]
    Parse(serde_json_core::de::Error),
    #[error("Backend host is empty")]
    EmptyHost,
    #[error("Backend port must be non-zero")]
    InvalidPort,
    #[error("Backend path must start with '/'")]
    InvalidPath,
    #[error("WiFi SSID is empty")]
    MissingWifiSsid,
    #[error("Field too long: {field}")]
    FieldTooLong { field: &'static str },
    #[error("Invalid timing: {field}")]
    InvalidTiming { field: &'static str },
}

#[derive(Deserialize, Debug, Default)]
pub struct Config<'a> {
    #[serde(default, borrow)]
    pub wifi: WifiConfig<'a>,
    #[serde(default, borrow)]
    pub backend: BackendConfig<'a>,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct WifiConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct BackendConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

impl Default for BackendConfig<'_> {
    fn default() -> Self {
        Self {
            host: DEFAULT_BACKEND_HOST,
            port: DEFAULT_BACKEND_PORT,
            path: DEFAULT_BACKEND_PATH,
        }
    }
}

/// Screen dwell and render cadence, in milliseconds
#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct DisplayConfig {
    pub btc_dwell_ms: u32,
    pub profit_dwell_ms: u32,
    pub screensaver_poll_ms: u32,
    pub render_interval_ms: u32,
    pub tick_yield_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            btc_dwell_ms: 8_000,
            profit_dwell_ms: 8_000,
            screensaver_poll_ms: 15_000,
            render_interval_ms: 1_000,
            tick_yield_ms: 10,
        }
    }
}

/// Reconnect and heartbeat timing, in milliseconds
#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct ConnectionConfig {
    pub reconnect_delay_ms: u32,
    /// Upper bound for exponential backoff; equal to `reconnect_delay_ms`
    /// for a fixed retry interval
    pub reconnect_max_delay_ms: u32,
    pub connect_timeout_ms: u32,
    pub ping_interval_ms: u32,
    pub pong_timeout_ms: u32,
    pub missed_pong_limit: u8,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 5_000,
            reconnect_max_delay_ms: 5_000,
            connect_timeout_ms: 5_000,
            ping_interval_ms: 15_000,
            pong_timeout_ms: 3_000,
            missed_pong_limit: 2,
        }
    }
}

/// Owned backend address handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: heapless::String<ENDPOINT_FIELD_CAPACITY>,
    pub port: u16,
    pub path: heapless::String<ENDPOINT_FIELD_CAPACITY>,
}

impl Endpoint {
    pub fn new(host: &str, port: u16, path: &str) -> Result<Self, ConfigError> {
        let mut owned_host = heapless::String::new();
        owned_host
            .push_str(host)
            .map_err(|_| ConfigError::FieldTooLong { field: "backend.host" })?;

        let mut owned_path = heapless::String::new();
        owned_path
            .push_str(path)
            .map_err(|_| ConfigError::FieldTooLong { field: "backend.path" })?;

        Ok(Self {
            host: owned_host,
            port,
            path: owned_path,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws://{}:{}{}", self.host, self.port, self.path)
    }
}

fn millis(value: u32) -> Duration {
    Duration::from_millis(value as u64)
}

fn non_zero(value: u32, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::InvalidTiming { field })
    } else {
        Ok(())
    }
}

impl<'a> Config<'a> {
    /// Decode a JSON configuration blob
    ///
    /// Strings are borrowed from `bytes`, so they must not contain escapes.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ConfigError> {
        let (config, _) =
            serde_json_core::from_slice::<Config<'a>>(bytes).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Check every field the core depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.backend.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if !self.backend.path.starts_with('/') {
            return Err(ConfigError::InvalidPath);
        }
        if self.wifi.ssid.is_empty() {
            return Err(ConfigError::MissingWifiSsid);
        }

        let display = &self.display;
        non_zero(display.btc_dwell_ms, "display.btc_dwell_ms")?;
        non_zero(display.profit_dwell_ms, "display.profit_dwell_ms")?;
        non_zero(display.screensaver_poll_ms, "display.screensaver_poll_ms")?;
        non_zero(display.render_interval_ms, "display.render_interval_ms")?;
        non_zero(display.tick_yield_ms, "display.tick_yield_ms")?;

        let connection = &self.connection;
        non_zero(connection.reconnect_delay_ms, "connection.reconnect_delay_ms")?;
        non_zero(connection.connect_timeout_ms, "connection.connect_timeout_ms")?;
        non_zero(connection.ping_interval_ms, "connection.ping_interval_ms")?;
        non_zero(connection.pong_timeout_ms, "connection.pong_timeout_ms")?;
        non_zero(
            connection.missed_pong_limit as u32,
            "connection.missed_pong_limit",
        )?;
        if connection.reconnect_max_delay_ms < connection.reconnect_delay_ms {
            return Err(ConfigError::InvalidTiming {
                field: "connection.reconnect_max_delay_ms",
            });
        }
        if connection.pong_timeout_ms >= connection.ping_interval_ms {
            return Err(ConfigError::InvalidTiming {
                field: "connection.pong_timeout_ms",
            });
        }

        self.endpoint().map(|_| ())
    }

    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Endpoint::new(self.backend.host, self.backend.port, self.backend.path)
    }

    pub fn screen_timings(&self) -> ScreenTimings {
        ScreenTimings {
            btc_dwell: millis(self.display.btc_dwell_ms),
            profit_dwell: millis(self.display.profit_dwell_ms),
            screensaver_poll: millis(self.display.screensaver_poll_ms),
        }
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        let connection = &self.connection;
        let reconnect = if connection.reconnect_max_delay_ms > connection.reconnect_delay_ms {
            ReconnectPolicy::Exponential {
                initial: millis(connection.reconnect_delay_ms),
                max: millis(connection.reconnect_max_delay_ms),
            }
        } else {
            ReconnectPolicy::Fixed(millis(connection.reconnect_delay_ms))
        };

        SupervisorSettings {
            reconnect,
            connect_timeout: millis(connection.connect_timeout_ms),
            ping_interval: millis(connection.ping_interval_ms),
            pong_timeout: millis(connection.pong_timeout_ms),
            missed_pong_limit: connection.missed_pong_limit,
        }
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            render_interval: millis(self.display.render_interval_ms),
            tick_yield: millis(self.display.tick_yield_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let raw = br#"{
            "wifi": { "ssid": "desk", "password": "hunter2" },
            "backend": { "host": "pluto.local", "port": 9000, "path": "/ws/telemetry" },
            "display": { "btc_dwell_ms": 5000 },
            "connection": { "reconnect_max_delay_ms": 60000 }
        }"#;

        let config = Config::parse(raw).unwrap();
        config.validate().unwrap();

        assert_eq!(config.wifi.ssid, "desk");
        assert_eq!(config.backend.port, 9000);
        assert_eq!(config.display.btc_dwell_ms, 5000);
        assert_eq!(config.display.profit_dwell_ms, 8000);

        let settings = config.supervisor_settings();
        assert_eq!(
            settings.reconnect,
            ReconnectPolicy::Exponential {
                initial: Duration::from_millis(5000),
                max: Duration::from_millis(60000),
            }
        );
    }

    #[test]
    fn test_parse_partial_sections() {
        let config = Config::parse(br#"{"wifi":{"ssid":"desk"},"backend":{"port":9000}}"#).unwrap();

        assert_eq!(config.wifi.ssid, "desk");
        assert_eq!(config.wifi.password, "");
        assert_eq!(config.backend.host, DEFAULT_BACKEND_HOST);
        assert_eq!(config.backend.port, 9000);
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_match_device_constants() {
        let config = Config::default();

        assert_eq!(config.backend.host, DEFAULT_BACKEND_HOST);
        let timings = config.screen_timings();
        assert_eq!(timings.btc_dwell, Duration::from_millis(8000));
        assert_eq!(timings.screensaver_poll, Duration::from_millis(15000));

        let settings = config.supervisor_settings();
        assert_eq!(
            settings.reconnect,
            ReconnectPolicy::Fixed(Duration::from_millis(5000))
        );
        assert_eq!(settings.ping_interval, Duration::from_millis(15000));
        assert_eq!(settings.pong_timeout, Duration::from_millis(3000));
        assert_eq!(settings.missed_pong_limit, 2);

        assert_eq!(
            config.scheduler_settings().render_interval,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingWifiSsid)
        ));

        config.wifi.ssid = "desk";
        config.validate().unwrap();

        config.backend.path = "ws/telemetry";
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPath)));

        config.backend.path = "/ws/telemetry";
        config.backend.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort)));

        config.backend.port = 8000;
        config.connection.reconnect_max_delay_ms = 1000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTiming { .. })
        ));
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            Config::parse(b"{\"backend\": {\"port\": \"x\"}}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_endpoint_display() {
        let endpoint = Config::default().endpoint().unwrap();
        assert_eq!(
            alloc::format!("{}", endpoint),
            "ws://192.168.1.208:8000/ws/telemetry"
        );
    }
}
