use std::path::PathBuf;

use chrono::{FixedOffset, Local};

/// Application-level constants
pub const APP_NAME: &str = "OPD Desk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Organisation name printed on every prescription.
pub const HOSPITAL_NAME: &str = "Tekisky Hospital";

/// Hosted OPD backend used when no override is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://hms-opd-backend-v1.vercel.app/api";

/// Default HTTP timeout for API calls.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const DATA_DIR_ENV: &str = "OPD_DATA_DIR";
const API_BASE_URL_ENV: &str = "OPD_API_BASE_URL";
const HTTP_TIMEOUT_ENV: &str = "OPD_HTTP_TIMEOUT_SECS";
const UTC_OFFSET_ENV: &str = "OPD_UTC_OFFSET_MINUTES";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "opd_desk_lib=info,opd_desk=info"
}

/// Get the application data directory.
/// `$OPD_DATA_DIR` when set, otherwise ~/OpdDesk/.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("OpdDesk")
}

/// Persisted login session.
pub fn session_file(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("session.json")
}

/// Where exported prescriptions land by default.
pub fn exports_dir(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("exports")
}

/// Settings for talking to the OPD backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
    /// Offset used to turn registration timestamps into calendar days.
    pub utc_offset: FixedOffset,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            utc_offset: *Local::now().offset(),
        }
    }
}

impl ClientConfig {
    /// Build from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Invalid values are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(HTTP_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "Ignoring invalid {HTTP_TIMEOUT_ENV}"),
            }
        }

        if let Some(raw) = lookup(UTC_OFFSET_ENV) {
            match raw.trim().parse::<i32>().ok().and_then(offset_from_minutes) {
                Some(offset) => config.utc_offset = offset,
                None => tracing::warn!(value = %raw, "Ignoring invalid {UTC_OFFSET_ENV}"),
            }
        }

        config
    }
}

/// Minutes east of UTC into a chrono offset. `None` outside ±24h.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}
