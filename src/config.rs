use serde::Deserialize;
use std::path::PathBuf;

use crate::binder::LogLayout;
use crate::env::{
    env_flag, env_or, NTA_LOG_APP_NAME_ENV, NTA_LOG_FORMATTED_ENV, NTA_LOG_LEVEL_ENV,
    NTA_LOG_ROOT_ENV,
};
use crate::level::Level;
use crate::wrap::DEFAULT_WRAP_WIDTH;

/// Command-line flag that turns on formatted output.
pub const FORMATTED_LOGS_FLAG: &str = "--formatted-logs";

pub const DEFAULT_APP_NAME: &str = "Application";

/// Logger configuration.
///
/// **Fields**
/// - `root`: the host's local-storage root; logs live under `root/var/log`
///   and incident files under `root/var/err`.
/// - `app_name`: application display name, the first part of every log
///   file name.
/// - `level`: initial threshold of every logger built from this config.
/// - `formatted_output`: wrap messages to `wrap_width` and follow each with
///   a divider.
/// - `wrap_width`: column width of wrapped output and of every divider.
///
/// Deserializable with every field optional, so a host can keep it in its
/// own property store.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub root: PathBuf,
    pub app_name: String,
    pub level: Level,
    pub formatted_output: bool,
    pub wrap_width: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            app_name: DEFAULT_APP_NAME.to_string(),
            level: Level::Info,
            formatted_output: false,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

impl LoggerConfig {
    pub fn new(root: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by the `NTA_LOG_*` environment variables.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let level = match std::env::var(NTA_LOG_LEVEL_ENV) {
            Ok(raw) => raw.parse::<Level>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring {}", NTA_LOG_LEVEL_ENV);
                defaults.level
            }),
            Err(_) => defaults.level,
        };

        Self {
            root: std::env::var_os(NTA_LOG_ROOT_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.root),
            app_name: env_or(NTA_LOG_APP_NAME_ENV, &defaults.app_name),
            level,
            formatted_output: env_flag(NTA_LOG_FORMATTED_ENV).unwrap_or(defaults.formatted_output),
            wrap_width: defaults.wrap_width,
        }
    }

    /// Turn formatted output on if the host's arguments carry
    /// [`FORMATTED_LOGS_FLAG`].
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if formatted_logs_requested(args) {
            self.formatted_output = true;
        }
        self
    }

    pub fn layout(&self) -> LogLayout {
        LogLayout::new(&self.root, self.app_name.clone())
    }
}

pub fn formatted_logs_requested<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().any(|a| a.as_ref() == FORMATTED_LOGS_FLAG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_enables_formatting() {
        let cfg = LoggerConfig::default().with_args(["app", "--formatted-logs"]);
        assert!(cfg.formatted_output);

        let cfg = LoggerConfig::default().with_args(["app", "--formatted"]);
        assert!(!cfg.formatted_output);
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: LoggerConfig =
            serde_json::from_str(r#"{ "app_name": "Ledger", "level": "WARNING" }"#).unwrap();
        assert_eq!(cfg.app_name, "Ledger");
        assert_eq!(cfg.level, Level::Warn);
        assert_eq!(cfg.wrap_width, DEFAULT_WRAP_WIDTH);
        assert!(!cfg.formatted_output);
    }

    #[test]
    fn layout_uses_root_and_name() {
        let cfg = LoggerConfig::new("/srv/app", "Ledger");
        let layout = cfg.layout();
        assert_eq!(layout.log_dir, PathBuf::from("/srv/app/var/log"));
        assert_eq!(layout.app_name, "Ledger");
    }
}
