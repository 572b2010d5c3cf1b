use std::path::PathBuf;

use crate::api::middleware::error_handling::FilterOptions;
use crate::infrastructure::RateTrackingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub log_format: LogFormat,
    pub filter: FilterOptions,
    // Optional TOML/YAML file overriding the env-derived filter options
    pub filter_config_path: Option<PathBuf>,
    pub rate_tracking: RateTrackingConfig,
    pub rate_cleanup_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = RateTrackingConfig::default();
        Self {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            log_format: match std::env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            filter: FilterOptions::from_env(),
            filter_config_path: std::env::var("ERROR_FILTER_CONFIG").ok().map(PathBuf::from),
            rate_tracking: RateTrackingConfig {
                errors_per_window: std::env::var("ERROR_RATE_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.errors_per_window),
                window_seconds: std::env::var("ERROR_RATE_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.window_seconds),
            },
            rate_cleanup_interval_secs: std::env::var("ERROR_RATE_CLEANUP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("LISTEN_ADDR cannot be empty".to_string());
        }

        if self.rate_tracking.errors_per_window == 0 {
            return Err("ERROR_RATE_THRESHOLD must be at least 1".to_string());
        }

        if self.rate_tracking.window_seconds == 0 {
            return Err("ERROR_RATE_WINDOW_SECS must be at least 1 second".to_string());
        }

        if self.rate_cleanup_interval_secs < 10 {
            return Err("ERROR_RATE_CLEANUP_SECS must be at least 10 seconds".to_string());
        }

        self.filter.validate().map_err(|e| e.to_string())
    }
}
