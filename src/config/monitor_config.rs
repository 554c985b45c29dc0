//! Monitor configuration loaded from TOML
//!
//! Every section implements `Default`, so a missing file or a partial file
//! both yield a complete configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::advisory::DEFAULT_PLACEHOLDER;
use crate::metrics::{
    AggregationRules, ReferenceClock, DEFAULT_BASELINE_WINDOW_DAYS, DEFAULT_DRINK_SCALE,
    DEFAULT_UTC_OFFSET_HOURS,
};
use crate::types::{ActiveFilter, SchemaPolicy};

/// Env var naming the config file
pub const CONFIG_ENV: &str = "MONITOR_CONFIG";
/// Env override for `server.addr`
pub const SERVER_ADDR_ENV: &str = "MONITOR_SERVER_ADDR";
/// Env override for `storage.path`
pub const DB_PATH_ENV: &str = "MONITOR_DB_PATH";

const LOCAL_CONFIG_FILE: &str = "monitor.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one monitor deployment.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$MONITOR_CONFIG` env var
/// 2. `./monitor.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub advisory: AdvisoryConfig,
}

impl MonitorConfig {
    /// Load configuration using the standard search order. Never fails; a
    /// broken file is logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {CONFIG_ENV}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MONITOR_SERVER_ADDR` / `MONITOR_DB_PATH` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(SERVER_ADDR_ENV).ok(),
            std::env::var(DB_PATH_ENV).ok(),
        );
    }

    /// Replace the bind address and database path when given. Empty values
    /// are ignored.
    pub fn apply_overrides(&mut self, addr: Option<String>, db_path: Option<String>) {
        if let Some(addr) = addr.filter(|a| !a.trim().is_empty()) {
            self.server.addr = addr;
        }
        if let Some(path) = db_path.filter(|p| !p.trim().is_empty()) {
            self.storage.path = PathBuf::from(path);
        }
    }

    /// Check cross-field constraints, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }
        if self.storage.timeout_ms == 0 {
            errors.push("storage.timeout_ms must be greater than 0".to_string());
        }

        let m = &self.metrics;
        if m.baseline_window_days == 0 {
            errors.push("metrics.baseline_window_days must be at least 1".to_string());
        }
        if ReferenceClock::from_offset_hours(m.utc_offset_hours).is_none() {
            errors.push(format!(
                "metrics.utc_offset_hours ({}) must be within -23..=23",
                m.utc_offset_hours
            ));
        }
        if !m.drink_scale.is_finite() || m.drink_scale <= 0.0 {
            errors.push(format!(
                "metrics.drink_scale ({}) must be a positive finite number",
                m.drink_scale
            ));
        }

        let a = &self.advisory;
        if a.timeout_secs == 0 {
            errors.push("advisory.timeout_secs must be greater than 0".to_string());
        }
        if a.placeholder.trim().is_empty() {
            errors.push("advisory.placeholder must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Reference clock for the configured offset. Falls back to UTC+9.
    pub fn clock(&self) -> ReferenceClock {
        ReferenceClock::from_offset_hours(self.metrics.utc_offset_hours).unwrap_or_default()
    }

    pub fn rules(&self) -> AggregationRules {
        AggregationRules {
            schema: self.metrics.schema,
            active_filter: self.metrics.active_filter,
            drink_scale: self.metrics.drink_scale,
        }
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.timeout_ms)
    }

    pub fn advisory_timeout(&self) -> Duration {
        Duration::from_secs(self.advisory.timeout_secs)
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `MONITOR_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Allowed browser origins. `"*"` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

fn default_cors_origins() -> Vec<String> {
    defaults::CORS_ORIGINS.iter().map(|s| (*s).to_string()).collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Upper bound on each storage call (ms)
    #[serde(default = "default_storage_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(defaults::DB_PATH)
}

fn default_storage_timeout_ms() -> u64 {
    defaults::STORAGE_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            timeout_ms: default_storage_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub schema: SchemaPolicy,
    pub active_filter: ActiveFilter,
    pub baseline_window_days: u32,
    /// Whole hours east of UTC defining the reference day
    pub utc_offset_hours: i32,
    /// Multiplier applied to summed `drinking_data`
    pub drink_scale: f64,
    pub movement_unit: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            schema: SchemaPolicy::default(),
            active_filter: ActiveFilter::default(),
            baseline_window_days: DEFAULT_BASELINE_WINDOW_DAYS,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            drink_scale: DEFAULT_DRINK_SCALE,
            movement_unit: defaults::MOVEMENT_UNIT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the env var holding the API key. Unset or empty selects the
    /// template backend.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Text returned when the generator fails or times out
    pub placeholder: String,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::ADVISORY_BASE_URL.to_string(),
            model: defaults::ADVISORY_MODEL.to_string(),
            api_key_env: defaults::ADVISORY_API_KEY_ENV.to_string(),
            timeout_secs: defaults::ADVISORY_TIMEOUT_SECS,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl AdvisoryConfig {
    /// API key from the configured env var, if present and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.addr, "0.0.0.0:8000");
        assert_eq!(config.metrics.baseline_window_days, 7);
        assert_eq!(config.clock().offset().local_minus_utc(), 9 * 3600);
        assert_eq!(config.rules(), AggregationRules::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[metrics]
schema = "magnitudes"
active_filter = "detected_only"

[storage]
path = "/tmp/monitor-test.db"
"#
        )
        .unwrap();

        let config = MonitorConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.metrics.schema, SchemaPolicy::Magnitudes);
        assert_eq!(config.metrics.active_filter, ActiveFilter::DetectedOnly);
        assert_eq!(config.metrics.drink_scale, 3.6);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/monitor-test.db"));
        assert_eq!(config.storage.timeout_ms, defaults::STORAGE_TIMEOUT_MS);
        assert_eq!(config.server.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = MonitorConfig::default();
        config.metrics.baseline_window_days = 0;
        config.metrics.utc_offset_hours = 30;
        config.storage.timeout_ms = 0;
        config.advisory.placeholder = " ".to_string();

        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[metrics]\nbaseline_window_days = 0").unwrap();
        assert!(matches!(
            MonitorConfig::load_from_file(file.path()),
            Err(ConfigError::Validation(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[metrics\nschema = ").unwrap();
        assert!(matches!(
            MonitorConfig::load_from_file(file.path()),
            Err(ConfigError::Parse(..))
        ));
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let mut config = MonitorConfig::default();
        config.apply_overrides(Some("127.0.0.1:9000".to_string()), Some(String::new()));
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.storage.path, PathBuf::from(defaults::DB_PATH));
    }
}
