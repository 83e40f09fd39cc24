//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `labrack.toml` in the working directory, or at the path named by
//! `LABRACK_CONFIG`. Every field has a default, and the defaults describe the
//! production rack, so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use chrono::Weekday;
use labrack_adapter_digest_http::DigestHttpConfig;
use labrack_adapter_line_tcp::LineTcpConfig;
use labrack_adapter_scrape_http::ScrapeHttpConfig;
use labrack_app::switch::RetryPolicy;
use labrack_domain::endpoint::{Credentials, DeviceEndpoint, ProtocolKind};
use labrack_domain::error::ValidationError;
use labrack_domain::plan::{PowerPlan, PowerStep};
use labrack_domain::schedule::{DaySet, WeeklySchedule};
use labrack_domain::time::parse_time_of_day;
use serde::Deserialize;

const DEFAULT_PATH: &str = "labrack.toml";

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// When the rack is powered on and off.
    pub schedule: ScheduleConfig,
    /// Bounds of every confirmed channel switch.
    pub switch: SwitchConfig,
    /// Per-protocol adapter settings.
    pub adapters: AdaptersConfig,
    /// Devices making up the rack.
    pub devices: Vec<DeviceConfig>,
    /// Ordered steps for rack power-on and power-off.
    pub plan: PowerPlan,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Weekly schedule configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Morning power-on trigger, `HH:MM`.
    pub power_on_at: String,
    /// Evening power-off trigger, `HH:MM`.
    pub power_off_at: String,
    /// Days the rack is powered on in the morning. Every other day is a rest day.
    pub workdays: Vec<Weekday>,
    /// How often the clock is checked, in milliseconds.
    pub poll_interval_ms: u64,
}

/// Confirmed switch bounds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
}

/// Settings shared by all devices of one protocol family.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdaptersConfig {
    pub scrape_http: ScrapeHttpConfig,
    pub digest_http: DigestHttpConfig,
    pub line_tcp: LineTcpConfig,
}

/// One device of the rack.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Name referenced by the power plan.
    pub name: String,
    pub host: String,
    /// Defaults to the protocol's conventional port.
    #[serde(default)]
    pub port: Option<u16>,
    pub protocol: ProtocolKind,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl DeviceConfig {
    fn new(name: &str, host: &str, protocol: ProtocolKind) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            port: None,
            protocol,
            user: None,
            password: None,
        }
    }

    /// Build the validated endpoint for this device.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name or host is empty or the port
    /// is zero.
    pub fn endpoint(&self) -> Result<DeviceEndpoint, ValidationError> {
        let credentials = match (&self.user, &self.password) {
            (None, None) => None,
            (user, password) => Some(Credentials::new(
                user.clone().unwrap_or_default(),
                password.clone().unwrap_or_default(),
            )),
        };
        DeviceEndpoint::new(
            &self.name,
            &self.host,
            self.port.unwrap_or_else(|| self.protocol.default_port()),
            self.protocol,
            credentials,
        )
    }
}

impl Config {
    /// Load configuration from `labrack.toml` (or `$LABRACK_CONFIG`), apply
    /// environment-variable overrides and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("LABRACK_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Validation`] for inconsistent values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LABRACK_POWER_ON_AT") {
            self.schedule.power_on_at = val;
        }
        if let Ok(val) = std::env::var("LABRACK_POWER_OFF_AT") {
            self.schedule.power_off_at = val;
        }
        if let Ok(val) = std::env::var("LABRACK_POLL_INTERVAL_MS") {
            if let Ok(ms) = val.parse() {
                self.schedule.poll_interval_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("LABRACK_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.weekly_schedule()?;
        if self.schedule.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        if self.switch.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "max_attempts must be non-zero".to_string(),
            ));
        }
        // A supply call can connect, send and wait for a reply, then settle.
        let line_tcp = &self.adapters.line_tcp;
        let supply_call_ms = line_tcp
            .timeout_ms
            .saturating_mul(3)
            .saturating_add(line_tcp.settle_ms);
        if self.switch.attempt_timeout_ms <= supply_call_ms {
            return Err(ConfigError::Validation(format!(
                "attempt_timeout_ms ({}) must exceed 3 x line_tcp.timeout_ms + line_tcp.settle_ms ({supply_call_ms})",
                self.switch.attempt_timeout_ms
            )));
        }
        let endpoints = self.endpoints()?;
        for (i, endpoint) in endpoints.iter().enumerate() {
            if endpoints[..i].iter().any(|e| e.name() == endpoint.name()) {
                return Err(ConfigError::Validation(format!(
                    "device `{}` is configured twice",
                    endpoint.name()
                )));
            }
        }
        self.plan
            .check_devices(endpoints.iter().map(DeviceEndpoint::name))
            .map_err(|err| ConfigError::Validation(err.to_string()))
    }

    /// Build the weekly schedule from the trigger times and workdays.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a malformed time or an empty
    /// workday list.
    pub fn weekly_schedule(&self) -> Result<WeeklySchedule, ConfigError> {
        let on = parse_time_of_day(&self.schedule.power_on_at)?;
        let off = parse_time_of_day(&self.schedule.power_off_at)?;
        let workdays: DaySet = self.schedule.workdays.iter().copied().collect();
        Ok(WeeklySchedule::new(on, off, workdays)?)
    }

    /// Validated endpoints of every configured device, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for the first invalid device.
    pub fn endpoints(&self) -> Result<Vec<DeviceEndpoint>, ConfigError> {
        self.devices
            .iter()
            .map(|device| device.endpoint().map_err(ConfigError::from))
            .collect()
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.schedule.poll_interval_ms)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.switch.max_attempts,
            Duration::from_millis(self.switch.attempt_timeout_ms),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        let webline = DeviceConfig {
            user: Some("admin".to_string()),
            password: Some("admin".to_string()),
            ..DeviceConfig::new("webline", "10.152.4.143", ProtocolKind::DigestHttp)
        };
        let steps = vec![
            PowerStep::only("webline", [0]),
            PowerStep::only("mx-154", [1]),
            PowerStep::only("mx-157", [1, 2]),
        ];
        Self {
            logging: LoggingConfig::default(),
            schedule: ScheduleConfig::default(),
            switch: SwitchConfig::default(),
            adapters: AdaptersConfig::default(),
            devices: vec![
                webline,
                DeviceConfig::new("mx-154", "10.152.4.154", ProtocolKind::LineTcp),
                DeviceConfig::new("mx-157", "10.152.4.157", ProtocolKind::LineTcp),
            ],
            plan: PowerPlan {
                power_on: steps.clone(),
                power_off: steps,
            },
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "labrackd=info,labrack=info".to_string(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            power_on_at: "08:30".to_string(),
            power_off_at: "18:00".to_string(),
            workdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            poll_interval_ms: 5000,
        }
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            attempt_timeout_ms: u64::try_from(policy.attempt_timeout.as_millis())
                .unwrap_or(u64::MAX),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
