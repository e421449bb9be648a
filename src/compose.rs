//! Rendering of [`LogRecord`]s into the text written to the log.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;

use crate::environment::{EnvironmentSnapshot, UNKNOWN};
use crate::error::LoggerError;
use crate::format::substitute;
use crate::level::MessageKind;
use crate::record::{LogRecord, Param};
use crate::wrap::{columns, divider, DEFAULT_WRAP_WIDTH};

/// Column the dot leaders of the critical report run to.
pub const REPORT_TAB_WIDTH: usize = 70;
pub const LEADER_CHAR: char = '.';
const MIN_LEADER: usize = 3;

/// Placeholder for an unset class or method name.
pub const UNKNOWN_SOURCE: &str = "unknown";

pub fn render_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Reject records that cannot be rendered for `kind`.
///
/// Error and critical messages must carry the fault they report.
pub fn validate(kind: MessageKind, record: &LogRecord) -> Result<(), LoggerError> {
    match kind {
        MessageKind::Error | MessageKind::Critical if record.thrown.is_none() => {
            Err(LoggerError::InvalidArgument(format!(
                "{:?} record from {}.{} carries no thrown value",
                kind,
                class_of(record),
                method_of(record)
            )))
        }
        _ => Ok(()),
    }
}

/// Builds the text for every message kind. Holds the divider drawn between
/// sections so that it matches the configured wrap width.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    divider: String,
}

impl Default for MessageComposer {
    fn default() -> Self {
        MessageComposer::new(DEFAULT_WRAP_WIDTH)
    }
}

impl MessageComposer {
    pub fn new(divider_width: usize) -> Self {
        MessageComposer {
            divider: divider(divider_width),
        }
    }

    /// Compose the main-log text for any kind except `Critical`, whose
    /// report goes through [`MessageComposer::critical_report`].
    ///
    /// `now` stands in for the record's instant when that is unset.
    pub fn compose(&self, kind: MessageKind, record: &LogRecord, now: DateTime<Utc>) -> String {
        let instant = render_instant(&record.instant.unwrap_or(now));
        let class = class_of(record);
        let method = method_of(record);
        let thread_id = record.thread.id;
        let seq = record.sequence_number;

        match kind {
            MessageKind::Enter => format!(
                "{} [SEQ {}]: {}: {}.{}({}); Thread ID: {}; {}",
                instant,
                seq,
                kind.label(),
                class,
                method,
                param_pairs(record).join(", "),
                thread_id,
                raw_message(record)
            ),
            MessageKind::Exit => format!(
                "{} [SEQ {}]: {}: {}.{}() RETURNING{}; Thread ID: {}; {}",
                instant,
                seq,
                kind.label(),
                class,
                method,
                param_pairs(record).concat(),
                thread_id,
                raw_message(record)
            ),
            _ => {
                let mut line = format!(
                    "{}[SEQ {}]: {} {}.{}(); Thread ID: {}; {}",
                    instant,
                    seq,
                    kind.label(),
                    class,
                    method,
                    thread_id,
                    message_text(record)
                );
                if matches!(kind, MessageKind::Error | MessageKind::Warn) {
                    self.append_thrown(&mut line, record);
                }
                line
            }
        }
    }

    fn append_thrown(&self, out: &mut String, record: &LogRecord) {
        let Some(thrown) = &record.thrown else {
            return;
        };
        let _ = write!(
            out,
            "\n{}\nError Message: {}\nStack Trace:",
            self.divider, thrown.message
        );
        for frame in &thrown.stack_trace {
            let _ = write!(out, "\n\t{}", frame);
        }
    }

    /// Full multi-section incident report for a critical record.
    pub fn critical_report(
        &self,
        record: &LogRecord,
        now: DateTime<Utc>,
        env: &EnvironmentSnapshot,
    ) -> String {
        let instant = render_instant(&record.instant.unwrap_or(now));
        let (thrown_type, thrown_message, frames) = match &record.thrown {
            Some(t) => (t.type_name.as_str(), t.message.as_str(), t.stack_trace.as_slice()),
            None => (UNKNOWN, "", &[][..]),
        };
        let div = &self.divider;
        let mut msg = String::new();

        let _ = writeln!(msg, "{} thrown at {}", thrown_type, instant);
        let _ = writeln!(
            msg,
            "Location: {}.{}({})",
            class_of(record),
            method_of(record),
            param_pairs(record).join(", ")
        );
        let _ = writeln!(msg, "Thread ID: {}", record.thread.id);
        let _ = writeln!(msg, "{}\nDetail Message: {}\n{}", div, raw_message(record), div);

        let app = &env.app;
        let _ = writeln!(msg, "Application Information:\n");
        let _ = writeln!(msg, "{} ({})", or_unknown(&app.name), or_unknown(&app.vendor));
        let _ = writeln!(msg, "\tVersion: {}", or_unknown(&app.version));
        let _ = writeln!(msg, "\nInstalled Modules:");
        for module in &app.installed_modules {
            let _ = writeln!(msg, "\t{}", module);
        }
        let _ = writeln!(msg, "{}", div);

        let _ = writeln!(msg, "\nSystem Information:\n");
        for (label, value) in [
            ("OS", &env.system.os_name),
            ("OS Version", &env.system.os_version),
            ("Architecture", &env.system.arch),
        ] {
            let _ = writeln!(msg, "{}", tab_leader(label, value));
        }
        let _ = writeln!(msg, "\n{}", div);

        let _ = writeln!(msg, "Runtime Information:\n");
        for (label, value) in &env.runtime {
            let _ = writeln!(msg, "{}", tab_leader(label, value));
        }

        let _ = writeln!(msg, "{}\nUser Information:\n", div);
        let user = &env.user;
        for (label, value) in [
            ("User Name", &user.name),
            ("User Home", &user.home),
            ("User Directory", &user.dir),
            ("User Country", &user.country),
            ("User Language", &user.language),
        ] {
            let _ = writeln!(msg, "{}", tab_leader(label, value));
        }

        let _ = writeln!(msg, "{}\nException Information:\n", div);
        let _ = write!(msg, "Exception Message: {}\n\nStack Trace:\n", thrown_message);
        for frame in frames {
            let _ = write!(msg, "\n\t{}", frame);
        }
        msg.push_str("\n ~ End of Stack Trace ~\n");
        msg
    }
}

/// `label` and `value` joined by a dot leader reaching [`REPORT_TAB_WIDTH`].
pub fn tab_leader(label: &str, value: &str) -> String {
    let value = or_unknown(value);
    let fill = REPORT_TAB_WIDTH
        .saturating_sub(columns(label) + columns(value))
        .max(MIN_LEADER);
    format!("{}{}{}", label, LEADER_CHAR.to_string().repeat(fill), value)
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        UNKNOWN
    } else {
        value
    }
}

pub(crate) fn class_of(record: &LogRecord) -> &str {
    record.source_class_name.as_deref().unwrap_or(UNKNOWN_SOURCE)
}

pub(crate) fn method_of(record: &LogRecord) -> &str {
    record.source_method_name.as_deref().unwrap_or(UNKNOWN_SOURCE)
}

fn param_pairs(record: &LogRecord) -> Vec<String> {
    record
        .parameters
        .iter()
        .flatten()
        .map(|p: &Param| format!("{} [{}]", p.type_name, p.display_value()))
        .collect()
}

/// The record's message, localized through its resource bundle if the
/// bundle has an entry for it.
fn raw_message(record: &LogRecord) -> &str {
    record
        .resource_bundle
        .as_ref()
        .and_then(|bundle| bundle.get(&record.message))
        .map(String::as_str)
        .unwrap_or(&record.message)
}

fn message_text(record: &LogRecord) -> String {
    let raw = raw_message(record);
    match &record.parameters {
        Some(params) => substitute(raw, params),
        None => raw.to_string(),
    }
}
