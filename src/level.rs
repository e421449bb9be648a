use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseLevelError;

/// Logging threshold of a [`Logger`](crate::logger::Logger), also used as the
/// severity tag of a [`LogRecord`](crate::record::LogRecord).
///
/// Apart from `Off`, levels are ordered by verbosity:
/// `Trace < Debug < Config < Info < Warn < Error < Critical`. A lower level is
/// more verbose and lets more message kinds through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Level {
    Off = 0,
    Trace = 1,
    Debug = 2,
    Config = 3,
    #[default]
    Info = 4,
    #[serde(alias = "WARNING")]
    Warn = 5,
    Error = 6,
    Critical = 7,
}

impl Level {
    pub const ALL: [Level; 8] = [
        Level::Off,
        Level::Trace,
        Level::Debug,
        Level::Config,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Critical,
    ];

    /// Position on the verbosity scale, `None` for `Off`.
    pub fn rank(self) -> Option<u8> {
        match self {
            Level::Off => None,
            other => Some(other as u8),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Off => "OFF",
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Config => "CONFIG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Level {
        match raw {
            1 => Level::Trace,
            2 => Level::Debug,
            3 => Level::Config,
            4 => Level::Info,
            5 => Level::Warn,
            6 => Level::Error,
            7 => Level::Critical,
            _ => Level::Off,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(Level::Off),
            "TRACE" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "CONFIG" => Ok(Level::Config),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" => Ok(Level::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// The eight kinds of message a logger can emit, one per emission method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Config,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
    Enter,
    Exit,
}

impl MessageKind {
    pub const ALL: [MessageKind; 8] = [
        MessageKind::Config,
        MessageKind::Debug,
        MessageKind::Info,
        MessageKind::Warn,
        MessageKind::Error,
        MessageKind::Critical,
        MessageKind::Enter,
        MessageKind::Exit,
    ];

    /// Severity the kind is gated at. Method tracing sits at `Trace`.
    pub fn severity(self) -> Level {
        match self {
            MessageKind::Enter | MessageKind::Exit => Level::Trace,
            MessageKind::Debug => Level::Debug,
            MessageKind::Config => Level::Config,
            MessageKind::Info => Level::Info,
            MessageKind::Warn => Level::Warn,
            MessageKind::Error => Level::Error,
            MessageKind::Critical => Level::Critical,
        }
    }

    /// Word written into the composed line. The single-line kinds carry a
    /// trailing colon, method tracing words do not.
    pub fn label(self) -> &'static str {
        match self {
            MessageKind::Config => "CONFIG:",
            MessageKind::Debug => "DEBUG:",
            MessageKind::Info => "INFO:",
            MessageKind::Warn => "WARNING:",
            MessageKind::Error => "ERROR:",
            MessageKind::Critical => "CRITICAL:",
            MessageKind::Enter => "ENTERING",
            MessageKind::Exit => "EXITING",
        }
    }
}

/// Decide whether a message of `kind` is written at `threshold`.
///
/// `Off` silences everything, including critical messages. Otherwise a
/// message is written when the threshold is at or below the kind's severity,
/// which makes `Critical` unconditional and `Enter`/`Exit` exclusive to
/// `Trace`.
pub fn should_emit(threshold: Level, kind: MessageKind) -> bool {
    match (threshold.rank(), kind.severity().rank()) {
        (Some(current), Some(severity)) => current <= severity,
        _ => false,
    }
}
