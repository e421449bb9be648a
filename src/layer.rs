use crate::level::Level as RecordLevel;
use crate::logger::Logger;
use crate::record::{LogRecord, Thrown};
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Targets of the logger's own diagnostics. Events from these are never
/// forwarded, since forwarding them would feed the logger its own output.
const ENGINE_TARGETS: [&str; 6] = [
    "nta_logger::logger",
    "nta_logger::critical",
    "nta_logger::registry",
    "nta_logger::config",
    "nta_logger::init",
    "nta_logger::layer",
];

/// Type name given to the fault synthesized for `ERROR` events.
pub const EVENT_FAULT_TYPE: &str = "tracing::Event";

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// writes them through a [`Logger`].
///
/// Levels map onto emission methods: `TRACE` and `DEBUG` go to `debug`,
/// `INFO` to `info`, `WARN` to `warn`, and `ERROR` to `error` with a
/// [`Thrown`] built from the event message. Event fields are appended to the
/// message as `{key=value, ...}`. Writing happens synchronously on the
/// thread that emitted the event.
pub struct RecordLayer {
    logger: Arc<Logger>,
    /// Total events seen by the layer.
    pub total_events: Arc<AtomicU64>,
    /// Events handed to the logger.
    pub forwarded_events: Arc<AtomicU64>,
    /// Events the logger refused.
    pub rejected_events: Arc<AtomicU64>,
}

impl RecordLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            total_events: Arc::new(AtomicU64::new(0)),
            forwarded_events: Arc::new(AtomicU64::new(0)),
            rejected_events: Arc::new(AtomicU64::new(0)),
        }
    }

    fn is_engine_event(target: &str) -> bool {
        ENGINE_TARGETS.iter().any(|t| target.starts_with(t))
    }
}

impl<S> Layer<S> for RecordLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if Self::is_engine_event(meta.target()) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let mut text = message.unwrap_or_default();
        if !fields.is_empty() {
            let pairs: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            text = format!("{} {{{}}}", text, pairs.join(", "));
        }

        let mut record = LogRecord::new(meta.module_path().unwrap_or(meta.target()));
        record.logger_name = Some(meta.target().to_string());
        record.source_method_name = Some(match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            _ => meta.name().to_string(),
        });
        record.message = text;

        let level = *meta.level();
        let result = if level == Level::ERROR {
            record.level = RecordLevel::Error;
            record.thrown = Some(Thrown::new(EVENT_FAULT_TYPE, record.message.clone()));
            self.logger.error(&record)
        } else if level == Level::WARN {
            record.level = RecordLevel::Warn;
            self.logger.warn(&record)
        } else if level == Level::INFO {
            record.level = RecordLevel::Info;
            self.logger.info(&record)
        } else {
            record.level = RecordLevel::Debug;
            self.logger.debug(&record)
        };

        match result {
            Ok(()) => self.forwarded_events.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.rejected_events.fetch_add(1, Ordering::Relaxed),
        };
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;
    use crate::environment::EnvironmentSnapshot;
    use crate::notifier::NoopNotifier;
    use tempfile::TempDir;
    use tracing_subscriber::layer::SubscriberExt;

    fn logger(tmp: &TempDir, level: RecordLevel) -> Arc<Logger> {
        let mut config = LoggerConfig::new(tmp.path(), "Ledger");
        config.level = level;
        Arc::new(Logger::with_collaborators(
            &config,
            Arc::new(EnvironmentSnapshot::default()),
            Arc::new(NoopNotifier),
        ))
    }

    #[test]
    fn events_are_written_through_the_logger() {
        let tmp = TempDir::new().unwrap();
        let logger = logger(&tmp, RecordLevel::Info);
        let layer = RecordLayer::new(Arc::clone(&logger));
        let forwarded = Arc::clone(&layer.forwarded_events);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "ledger::journal", entries = 3, "posted batch");
            tracing::debug!(target: "ledger::journal", "too verbose");
            tracing::error!(target: "ledger::journal", "checksum mismatch");
        });

        let text = std::fs::read_to_string(logger.log_path()).unwrap();
        assert!(text.contains("INFO: "));
        assert!(text.contains("posted batch {entries=3}"));
        assert!(!text.contains("too verbose"));
        assert!(text.contains("ERROR: "));
        assert!(text.contains("Error Message: checksum mismatch"));
        assert_eq!(forwarded.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn engine_diagnostics_are_not_forwarded() {
        let tmp = TempDir::new().unwrap();
        let logger = logger(&tmp, RecordLevel::Trace);
        let layer = RecordLayer::new(Arc::clone(&logger));
        let total = Arc::clone(&layer.total_events);
        let forwarded = Arc::clone(&layer.forwarded_events);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "nta_logger::logger", "internal notice");
        });

        assert_eq!(total.load(Ordering::Relaxed), 1);
        assert_eq!(forwarded.load(Ordering::Relaxed), 0);
    }
}
