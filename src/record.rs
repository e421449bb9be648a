use chrono::{DateTime, Utc};
use serde::Serialize;
use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::level::Level;

/// Localized message texts keyed by the raw message.
pub type ResourceBundle = BTreeMap<String, String>;

/// One logging event, built by the caller and handed to one of the emission
/// methods of [`Logger`](crate::logger::Logger).
///
/// The logger reads every field during the call and keeps nothing, so a
/// record may be mutated and reused between calls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogRecord {
    /// Event time; the composer substitutes "now" when unset.
    pub instant: Option<DateTime<Utc>>,
    pub level: Level,
    pub logger_name: Option<String>,
    /// Raw text, possibly containing printf-style directives.
    pub message: String,
    /// Substitution values for `message`, or the method arguments / return
    /// value for enter and exit records.
    pub parameters: Option<Vec<Param>>,
    pub resource_bundle: Option<ResourceBundle>,
    pub resource_bundle_name: Option<String>,
    pub sequence_number: u64,
    pub source_class_name: Option<String>,
    pub source_method_name: Option<String>,
    pub thread: ThreadInfo,
    pub thrown: Option<Thrown>,
}

impl LogRecord {
    /// Start a record for `source_class_name`, captured on the current thread.
    pub fn new(source_class_name: impl Into<String>) -> Self {
        LogRecord {
            source_class_name: Some(source_class_name.into()),
            thread: ThreadInfo::current(),
            ..Default::default()
        }
    }

    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.source_method_name = Some(name.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn params(mut self, params: Vec<Param>) -> Self {
        self.parameters = Some(params);
        self
    }

    pub fn at(mut self, instant: DateTime<Utc>) -> Self {
        self.instant = Some(instant);
        self
    }

    pub fn sequence(mut self, n: u64) -> Self {
        self.sequence_number = n;
        self
    }

    pub fn thrown(mut self, thrown: Thrown) -> Self {
        self.thrown = Some(thrown);
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

/// A single parameter value together with the name of its type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub type_name: String,
    pub value: serde_json::Value,
}

impl Param {
    pub fn new(type_name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Param {
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// Capture any serializable value, naming it after its Rust type with
    /// module paths stripped (`Vec<String>`, not `alloc::vec::Vec<...>`).
    pub fn of<T: Serialize>(value: &T) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        Param {
            type_name: short_type_name(std::any::type_name::<T>()),
            value,
        }
    }

    /// Value text as it appears inside log lines: strings unquoted, every
    /// other JSON value in its compact form.
    pub fn display_value(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}

/// Fault attached to error, warning and critical records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thrown {
    pub type_name: String,
    pub message: String,
    pub stack_trace: Vec<String>,
}

impl Thrown {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Thrown {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace: Vec::new(),
        }
    }

    pub fn with_stack_trace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stack_trace = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Snapshot an error value: its type, display text, the chain of
    /// `source()` errors and a backtrace of the calling thread.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let mut frames = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            frames.push(format!("Caused by: {}", cause));
            source = cause.source();
        }

        let backtrace = Backtrace::force_capture().to_string();
        frames.extend(
            backtrace
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );

        Thrown {
            type_name: short_type_name(std::any::type_name::<E>()),
            message: err.to_string(),
            stack_trace: frames,
        }
    }
}

/// Lifecycle state of the thread that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ThreadState {
    New,
    #[default]
    Runnable,
    Blocked,
    Waiting,
    TimedWaiting,
    Terminated,
}

pub const NORMAL_PRIORITY: i32 = 5;

/// Attributes of the capturing thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadInfo {
    pub id: u64,
    pub name: Option<String>,
    pub priority: i32,
    pub state: ThreadState,
}

impl Default for ThreadInfo {
    fn default() -> Self {
        ThreadInfo {
            id: 0,
            name: None,
            priority: NORMAL_PRIORITY,
            state: ThreadState::Runnable,
        }
    }
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

impl ThreadInfo {
    /// Describe the calling thread. Ids are numeric, stable for the life of
    /// the thread and unique within the process.
    pub fn current() -> Self {
        let handle = std::thread::current();
        ThreadInfo {
            id: THREAD_ID.with(|id| *id),
            name: handle.name().map(str::to_string),
            priority: NORMAL_PRIORITY,
            state: ThreadState::Runnable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("outer failed")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("disk unplugged")
        }
    }

    impl Error for Inner {}

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn short_type_names_drop_module_paths() {
        assert_eq!(short_type_name("i32"), "i32");
        assert_eq!(short_type_name("alloc::string::String"), "String");
        assert_eq!(
            short_type_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(short_type_name("&str"), "&str");
    }

    #[test]
    fn param_of_captures_type_and_value() {
        let p = Param::of(&5i32);
        assert_eq!(p.type_name, "i32");
        assert_eq!(p.display_value(), "5");

        let p = Param::of(&String::from("abc"));
        assert_eq!(p.type_name, "String");
        assert_eq!(p.display_value(), "abc");
    }

    #[test]
    fn thrown_from_error_walks_source_chain() {
        let thrown = Thrown::from_error(&Outer(Inner));
        assert_eq!(thrown.type_name, "Outer");
        assert_eq!(thrown.message, "outer failed");
        assert_eq!(thrown.stack_trace[0], "Caused by: disk unplugged");
    }

    #[test]
    fn thread_ids_are_stable_and_distinct() {
        let here = ThreadInfo::current();
        assert_eq!(here.id, ThreadInfo::current().id);

        let there = std::thread::spawn(ThreadInfo::current).join().unwrap();
        assert_ne!(here.id, there.id);
    }

    #[test]
    fn builder_populates_fields() {
        let record = LogRecord::new("Inventory")
            .method("load")
            .message("Loaded %d items")
            .params(vec![Param::of(&5)])
            .sequence(7);

        assert_eq!(record.source_class_name.as_deref(), Some("Inventory"));
        assert_eq!(record.source_method_name.as_deref(), Some("load"));
        assert_eq!(record.sequence_number, 7);
        assert!(record.instant.is_none());
    }
}
