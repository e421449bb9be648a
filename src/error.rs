use std::path::PathBuf;

/// Error type returned by the emission and control operations of a
/// [`Logger`](crate::logger::Logger).
///
/// Only programmer faults surface here. I/O failures while writing the log
/// are recovered inside the logger and reported through the
/// [`HostNotifier`](crate::notifier::HostNotifier) instead.
#[derive(thiserror::Error, Debug)]
pub enum LoggerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to install tracing subscriber: {0}")]
    Subscriber(String),
}

impl LoggerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoggerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error type returned when parsing a [`Level`](crate::level::Level) name.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown logging level: {0:?}")]
pub struct ParseLevelError(pub String);
