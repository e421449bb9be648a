pub mod error;
pub mod level;
pub mod record;
pub mod format;
pub mod compose;
pub mod wrap;
pub mod environment;
pub mod critical;
pub mod binder;
pub mod notifier;
pub mod logger;
pub mod registry;

pub mod config;
pub mod env;

#[cfg(feature = "bridge")]
pub mod layer;
#[cfg(feature = "bridge")]
pub mod init;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use level::{Level, MessageKind};
pub use logger::Logger;
pub use record::{LogRecord, Param, ThreadInfo, Thrown};
pub use registry::LoggerRegistry;
