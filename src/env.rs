//! Environment variable names read by [`LoggerConfig::from_env`].
//!
//! These are purely helpers for hosts that configure the logger from the
//! process environment. Configuration comes from the environment only when
//! the host calls `from_env`; a [`Logger`](crate::logger::Logger) never reads
//! these variables on its own.
//!
//! [`LoggerConfig::from_env`]: crate::config::LoggerConfig::from_env

/// Local-storage root; logs go to `<root>/var/log`, incidents to `<root>/var/err`.
pub const NTA_LOG_ROOT_ENV: &str = "NTA_LOG_ROOT";

/// Application display name used in log file names.
pub const NTA_LOG_APP_NAME_ENV: &str = "NTA_LOG_APP_NAME";

/// Initial threshold, e.g. `DEBUG` or `off`.
pub const NTA_LOG_LEVEL_ENV: &str = "NTA_LOG_LEVEL";

/// `true`/`1`/`yes` enables wrapped, divided output.
pub const NTA_LOG_FORMATTED_ENV: &str = "NTA_LOG_FORMATTED";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
