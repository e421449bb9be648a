use crate::error::LoggerError;
use crate::layer::RecordLayer;
use crate::logger::Logger;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the global `tracing` bridge.
///
/// **Fields**
/// - `enable_console`: if `true`, a `tracing_subscriber::fmt::Layer`
///   writing to standard error is installed next to the [`RecordLayer`], so
///   events (including the logger's own diagnostics) also show up in the
///   terminal.
#[derive(Clone, Debug, Default)]
pub struct BridgeConfig {
    pub enable_console: bool,
}

/// Install a global `tracing` subscriber that writes every event through
/// `logger`.
///
/// **Parameters**
/// - `logger`: the [`Logger`] that receives the converted records.
/// - `config`: [`BridgeConfig`] controlling the optional console output.
///
/// **Errors**
///
/// [`LoggerError::Subscriber`] if a global subscriber is already set.
pub fn init_tracing_with_config(logger: Arc<Logger>, config: BridgeConfig) -> Result<(), LoggerError> {
    let layer = RecordLayer::new(logger);

    // The two subscriber shapes have different types, so each branch
    // installs its own.
    let installed = if config.enable_console {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    };

    installed.map_err(|e| LoggerError::Subscriber(e.to_string()))
}

/// Equivalent to [`init_tracing_with_config`] with [`BridgeConfig::default`].
pub fn init_tracing(logger: Arc<Logger>) -> Result<(), LoggerError> {
    init_tracing_with_config(logger, BridgeConfig::default())
}
