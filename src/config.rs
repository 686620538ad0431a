//! Configuration management for the holiday planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PlannerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the holiday planner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Geocoding provider settings
    pub geocoding: GeocodingConfig,
    /// Weather provider settings
    pub weather: WeatherConfig,
    /// Destination store settings
    pub store: StoreConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
    /// PEM certificate chain, enables TLS together with `tls_key_path`
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

/// Which geocoding service resolves place names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeocodingProvider {
    Nominatim,
    OpenMeteo,
}

/// Geocoding API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub provider: GeocodingProvider,
    /// Base URL of the geocoding API; empty selects the provider's public endpoint
    pub base_url: String,
    /// User agent sent with every request (Nominatim rejects anonymous clients)
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Retries for transient failures
    pub max_retries: u32,
    pub max_requests_per_minute: u32,
    /// Minimum spacing between requests; Nominatim allows one per second
    pub min_request_interval_ms: u64,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL for the forecast API
    pub base_url: String,
    /// Base URL for the historical archive API
    pub archive_base_url: String,
    /// Daily variables requested from the provider
    pub daily: Vec<String>,
    pub timezone: String,
    /// Windows ending more than this many days ago are served from the archive
    pub archive_lag_days: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Retries for transient failures
    pub max_retries: u32,
}

/// Destination storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Fjall,
    Memory,
}

/// Destination store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory of the fjall database
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP endpoint for span export, disabled when unset
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_user_agent() -> String {
    format!("holiday_planner/{}", crate::VERSION)
}

fn default_timeout() -> u32 {
    30
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_min_request_interval_ms() -> u64 {
    1000
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_archive_base_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

fn default_daily_variables() -> Vec<String> {
    ["temperature_2m_max", "temperature_2m_min", "precipitation_sum"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_timezone() -> String {
    "auto".to_string()
}

fn default_archive_lag_days() -> u32 {
    5
}

fn default_store_location() -> String {
    "data/destinations".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_body_bytes: default_max_body_bytes(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            provider: GeocodingProvider::Nominatim,
            base_url: String::new(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
            max_requests_per_minute: default_requests_per_minute(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            archive_base_url: default_archive_base_url(),
            daily: default_daily_variables(),
            timezone: default_timezone(),
            archive_lag_days: default_archive_lag_days(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Fjall,
            location: default_store_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl GeocodingConfig {
    /// Base URL to use, falling back to the provider's public endpoint
    #[must_use]
    pub fn effective_base_url(&self) -> &str {
        if !self.base_url.is_empty() {
            return &self.base_url;
        }
        match self.provider {
            GeocodingProvider::Nominatim => "https://nominatim.openstreetmap.org",
            GeocodingProvider::OpenMeteo => "https://geocoding-api.open-meteo.com/v1",
        }
    }
}

impl PlannerConfig {
    /// Load configuration from `config_path`, or the default location when `None`,
    /// then apply `HOLIDAY_PLANNER_*` environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // HOLIDAY_PLANNER_SERVER__PORT=9000 style overrides
        builder = builder.add_source(
            Environment::with_prefix("HOLIDAY_PLANNER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("holiday-planner").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.max_body_bytes == 0 {
            self.server.max_body_bytes = default_max_body_bytes();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_timeout();
        }
        if self.geocoding.max_requests_per_minute == 0 {
            self.geocoding.max_requests_per_minute = default_requests_per_minute();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.archive_base_url.is_empty() {
            self.weather.archive_base_url = default_archive_base_url();
        }
        if self.weather.daily.is_empty() {
            self.weather.daily = default_daily_variables();
        }
        if self.weather.timezone.is_empty() {
            self.weather.timezone = default_timezone();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.store.location.is_empty() {
            self.store.location = default_store_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(PlannerError::config("Server port cannot be 0").into());
        }

        for (name, timeout) in [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
        ] {
            if timeout > 300 {
                return Err(PlannerError::config(format!(
                    "{name} API timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        for (name, retries) in [
            ("Geocoding", self.geocoding.max_retries),
            ("Weather", self.weather.max_retries),
        ] {
            if retries > 10 {
                return Err(
                    PlannerError::config(format!("{name} API max retries cannot exceed 10")).into(),
                );
            }
        }

        if self.weather.archive_lag_days > 365 {
            return Err(PlannerError::config("Archive lag cannot exceed 365 days").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoding", self.geocoding.effective_base_url()),
            ("Weather", self.weather.base_url.as_str()),
            ("Weather archive", self.weather.archive_base_url.as_str()),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlannerError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(PlannerError::config(
                "TLS needs both tls_cert_path and tls_key_path",
            )
            .into());
        }

        Ok(())
    }
}
