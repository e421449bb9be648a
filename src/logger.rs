use chrono::Utc;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::binder::{LogFileBinder, RenameOutcome};
use crate::compose::{validate, MessageComposer};
use crate::config::LoggerConfig;
use crate::critical::{incident_file_name, pointer_line, CriticalDumpWriter};
use crate::environment::{AppInfo, EnvironmentSnapshot};
use crate::error::LoggerError;
use crate::level::{should_emit, Level, MessageKind};
use crate::notifier::{HostNotifier, StderrNotifier};
use crate::record::LogRecord;
use crate::wrap::format_block;

/// Leveled file logger owned by one class of the host application.
///
/// A logger starts out writing to `<App> - null.log`, or `<App> - null.<n>.log`
/// while another unbound logger holds that name, and is bound to its class
/// once, which renames the file to `<App> - <ClassName>.log`. Every
/// emission method gates the record on the current level, composes it, and
/// appends it to the file with a flush, all synchronously. Writes, the
/// rename and `close` are serialized by one lock, so lines from concurrent
/// callers never interleave.
///
/// I/O failures never reach the caller; they go to the [`HostNotifier`].
/// The `Result` of the emission methods only reports misuse.
pub struct Logger {
    level: AtomicU8,
    formatted_output: AtomicBool,
    wrap_width: usize,
    composer: MessageComposer,
    dumps: CriticalDumpWriter,
    env: Arc<EnvironmentSnapshot>,
    notifier: Arc<dyn HostNotifier>,
    output: Mutex<Output>,
}

struct Output {
    binder: LogFileBinder,
    /// `None` once closed, or when the file could not be opened.
    writer: Option<BufWriter<File>>,
}

impl Logger {
    /// Open an unbound logger that reports to standard error and describes
    /// the current process in critical reports.
    pub fn new(config: &LoggerConfig) -> Self {
        let app = AppInfo {
            name: config.app_name.clone(),
            ..AppInfo::default()
        };
        Self::with_collaborators(
            config,
            Arc::new(EnvironmentSnapshot::capture(app)),
            Arc::new(StderrNotifier),
        )
    }

    /// Open an unbound logger with host-supplied environment data and
    /// failure notifier.
    pub fn with_collaborators(
        config: &LoggerConfig,
        env: Arc<EnvironmentSnapshot>,
        notifier: Arc<dyn HostNotifier>,
    ) -> Self {
        let layout = config.layout();
        let dumps = CriticalDumpWriter::new(layout.err_dir.clone());

        let (binder, writer) = match LogFileBinder::open(layout.clone()) {
            Ok((binder, file)) => {
                tracing::debug!(path = %binder.current_path().display(), "log file opened");
                (binder, Some(BufWriter::new(file)))
            }
            Err(e) => {
                let binder = LogFileBinder::new(layout);
                let (path, source) = match e {
                    LoggerError::Io { path, source } => (path, source),
                    other => (
                        binder.current_path().to_path_buf(),
                        io::Error::new(io::ErrorKind::Other, other.to_string()),
                    ),
                };
                tracing::warn!(path = %path.display(), error = %source, "unable to create log file");
                notifier.io_failure("Unable to create the log file", &path, &source, None);
                (binder, None)
            }
        };

        Logger {
            level: AtomicU8::new(config.level as u8),
            formatted_output: AtomicBool::new(config.formatted_output),
            wrap_width: config.wrap_width,
            composer: MessageComposer::new(config.wrap_width),
            dumps,
            env,
            notifier,
            output: Mutex::new(Output { binder, writer }),
        }
    }

    pub fn config(&self, record: &LogRecord) -> Result<(), LoggerError> {
        self.emit(MessageKind::Config, record)
    }

    pub fn debug(&self, record: &LogRecord) -> Result<(), LoggerError> {
        self.emit(MessageKind::Debug, record)
    }

    pub fn info(&self, record: &LogRecord) -> Result<(), LoggerError> {
        self.emit(MessageKind::Info, record)
    }

    /// Warnings may carry a `thrown` value; its message and stack trace are
    /// appended below a divider.
    pub fn warn(&self, record: &LogRecord) -> Result<(), LoggerError> {
        self.emit(MessageKind::Warn, record)
    }

    /// Recoverable error. The record must carry a `thrown` value.
    pub fn error(&self, record: &LogRecord) -> Result<(), LoggerError> {
        self.emit(MessageKind::Error, record)
    }

    /// Method entry; `parameters` holds the arguments. Written at `Trace` only.
    pub fn enter(&self, record: &LogRecord) -> Result<(), LoggerError> {
        self.emit(MessageKind::Enter, record)
    }

    /// Method exit; `parameters` holds the return value, if any. Written at
    /// `Trace` only.
    pub fn exit(&self, record: &LogRecord) -> Result<(), LoggerError> {
        self.emit(MessageKind::Exit, record)
    }

    /// Unrecoverable error. Writes a full environment report into its own
    /// incident file under `var/err` and a one-line pointer to it into this
    /// log. Written at every level except `Off`.
    ///
    /// The record must carry a `thrown` value. If the incident file cannot
    /// be written the failure goes to the notifier and the pointer line is
    /// still attempted.
    pub fn critical(&self, record: &LogRecord) -> Result<(), LoggerError> {
        validate(MessageKind::Critical, record)?;
        if !should_emit(self.level(), MessageKind::Critical) {
            return Ok(());
        }

        let instant = record.instant.unwrap_or_else(Utc::now);
        let report = self.composer.critical_report(record, instant, &self.env);

        let incident = match self.dumps.write(record, &instant, &report) {
            Ok(path) => path,
            Err(e) => {
                self.report_error("Unable to write critical incident", e, Some(&report));
                self.dumps.dir().join(incident_file_name(record, &instant))
            }
        };

        self.write_message(&pointer_line(&instant, &incident));
        Ok(())
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn is_formatted_output(&self) -> bool {
        self.formatted_output.load(Ordering::Relaxed)
    }

    pub fn set_formatted_output(&self, formatted: bool) {
        self.formatted_output.store(formatted, Ordering::Relaxed);
    }

    pub fn class_name(&self) -> Option<String> {
        self.output.lock().binder.class_name().map(str::to_string)
    }

    /// Bind the logger to its owning class. Fails with `InvalidArgument` for
    /// a blank name and with `InvalidState` if a class is already bound.
    /// The file keeps its placeholder name until [`Logger::update_log_name`].
    pub fn set_class_name(&self, class_name: &str) -> Result<(), LoggerError> {
        self.output.lock().binder.set_class_name(class_name)
    }

    /// Rename the log file to its bound name. A failed rename is reported
    /// to the notifier and logging continues under the old name.
    pub fn update_log_name(&self) -> Result<(), LoggerError> {
        let outcome = self.output.lock().binder.update_log_name()?;
        self.handle_rename(outcome);
        Ok(())
    }

    /// [`Logger::set_class_name`] followed by [`Logger::update_log_name`].
    pub fn bind(&self, class_name: &str) -> Result<(), LoggerError> {
        let outcome = self.output.lock().binder.bind(class_name)?;
        self.handle_rename(outcome);
        Ok(())
    }

    /// Where the log file currently lives.
    pub fn log_path(&self) -> PathBuf {
        self.output.lock().binder.current_path().to_path_buf()
    }

    pub fn incident_dir(&self) -> &Path {
        self.dumps.dir()
    }

    pub fn is_closed(&self) -> bool {
        self.output.lock().writer.is_none()
    }

    /// Flush and release the log file. Calling it again is harmless;
    /// records emitted afterwards are reported as lost.
    pub fn close(&self) {
        let (path, writer) = {
            let mut out = self.output.lock();
            (out.binder.current_path().to_path_buf(), out.writer.take())
        };
        let Some(writer) = writer else {
            return;
        };

        match writer.into_inner().map_err(io::IntoInnerError::into_error) {
            Ok(_file) => tracing::debug!(path = %path.display(), "log file closed"),
            Err(e) => self.notify_io("Unable to close the log file", &path, &e, None),
        }
    }

    fn emit(&self, kind: MessageKind, record: &LogRecord) -> Result<(), LoggerError> {
        validate(kind, record)?;
        if !should_emit(self.level(), kind) {
            return Ok(());
        }

        let text = self.composer.compose(kind, record, Utc::now());
        self.write_message(&text);
        Ok(())
    }

    fn write_message(&self, message: &str) {
        let text = if self.is_formatted_output() {
            format_block(message, self.wrap_width)
        } else {
            message.to_string()
        };

        let (path, result) = {
            let mut out = self.output.lock();
            let path = out.binder.current_path().to_path_buf();
            let result = match out.writer.as_mut() {
                Some(writer) => write_line(writer, &text),
                None => Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "log file is not open",
                )),
            };
            (path, result)
        };

        if let Err(e) = result {
            self.notify_io("Unable to write message to log file", &path, &e, Some(&text));
        }
    }

    fn handle_rename(&self, outcome: RenameOutcome) {
        match outcome {
            RenameOutcome::Renamed { from, to } => {
                tracing::debug!(from = %from.display(), to = %to.display(), "log file renamed");
            }
            RenameOutcome::AlreadyInPlace(_) => {}
            RenameOutcome::Failed { from, to, error } => {
                tracing::warn!(
                    from = %from.display(),
                    to = %to.display(),
                    error = %error,
                    "log file rename failed, keeping old name"
                );
                self.notifier.rename_failed(&from, &to, &error);
            }
        }
    }

    fn report_error(&self, context: &str, err: LoggerError, payload: Option<&str>) {
        match err {
            LoggerError::Io { path, source } => self.notify_io(context, &path, &source, payload),
            other => tracing::warn!(error = %other, "{}", context),
        }
    }

    fn notify_io(&self, context: &str, path: &Path, error: &io::Error, payload: Option<&str>) {
        tracing::warn!(path = %path.display(), error = %error, "{}", context);
        self.notifier.io_failure(context, path, error, payload);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("formatted_output", &self.is_formatted_output())
            .field("log_path", &self.log_path())
            .finish_non_exhaustive()
    }
}

fn write_line(writer: &mut BufWriter<File>, text: &str) -> io::Result<()> {
    writer.write_all(text.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Param, Thrown};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recording {
        renames: Mutex<Vec<(PathBuf, PathBuf)>>,
        failures: Mutex<Vec<String>>,
    }

    impl HostNotifier for Recording {
        fn rename_failed(&self, from: &Path, to: &Path, _error: &io::Error) {
            self.renames.lock().push((from.to_path_buf(), to.to_path_buf()));
        }

        fn io_failure(&self, context: &str, _path: &Path, _error: &io::Error, _payload: Option<&str>) {
            self.failures.lock().push(context.to_string());
        }
    }

    fn open(tmp: &TempDir, level: Level) -> (Logger, Arc<Recording>) {
        let mut config = LoggerConfig::new(tmp.path(), "Ledger");
        config.level = level;
        let notifier = Arc::new(Recording::default());
        let logger = Logger::with_collaborators(
            &config,
            Arc::new(EnvironmentSnapshot::default()),
            notifier.clone(),
        );
        (logger, notifier)
    }

    fn record(message: &str) -> LogRecord {
        LogRecord::new("Journal")
            .method("post")
            .message(message)
            .at(Utc.with_ymd_and_hms(2021, 10, 31, 8, 0, 0).unwrap())
    }

    fn contents(logger: &Logger) -> String {
        fs::read_to_string(logger.log_path()).unwrap()
    }

    #[test]
    fn starts_unbound_under_placeholder() {
        let tmp = TempDir::new().unwrap();
        let (logger, _) = open(&tmp, Level::Info);
        assert!(logger.log_path().ends_with("var/log/Ledger - null.log"));
        assert!(logger.log_path().exists());
        assert_eq!(logger.class_name(), None);
    }

    #[test]
    fn gated_records_are_not_written() {
        let tmp = TempDir::new().unwrap();
        let (logger, _) = open(&tmp, Level::Info);

        logger.debug(&record("hidden")).unwrap();
        logger.config(&record("hidden too")).unwrap();
        logger.enter(&record("hidden entry")).unwrap();
        logger.info(&record("shown")).unwrap();

        let text = contents(&logger);
        assert!(!text.contains("hidden"));
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("INFO: Journal.post(); Thread ID: "));
    }

    #[test]
    fn off_silences_critical() {
        let tmp = TempDir::new().unwrap();
        let (logger, _) = open(&tmp, Level::Off);
        let r = record("fatal").thrown(Thrown::new("Panic", "boom"));
        logger.critical(&r).unwrap();

        assert_eq!(contents(&logger), "");
        assert!(!logger.incident_dir().exists());
    }

    #[test]
    fn error_without_thrown_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let (logger, _) = open(&tmp, Level::Trace);
        assert!(matches!(
            logger.error(&record("oops")),
            Err(LoggerError::InvalidArgument(_))
        ));
        assert!(logger.critical(&record("oops")).is_err());
        assert_eq!(contents(&logger), "");
    }

    #[test]
    fn formatted_output_wraps_and_adds_divider() {
        let tmp = TempDir::new().unwrap();
        let (logger, _) = open(&tmp, Level::Info);
        logger.set_formatted_output(true);

        let long = "word ".repeat(40);
        logger.info(&record(long.trim_end())).unwrap();

        let text = contents(&logger);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.len() > 2);
        assert_eq!(*lines.last().unwrap(), "-".repeat(65));
        assert!(lines.iter().all(|l| l.chars().count() <= 65));
    }

    #[test]
    fn level_and_flags_are_mutable() {
        let tmp = TempDir::new().unwrap();
        let (logger, _) = open(&tmp, Level::Info);
        logger.set_level(Level::Trace);
        assert_eq!(logger.level(), Level::Trace);

        logger
            .enter(&record("in").params(vec![Param::of(&1), Param::of(&"two")]))
            .unwrap();
        assert!(contents(&logger).contains("ENTERING: Journal.post(i32 [1], &str [two]);"));
    }

    #[test]
    fn failed_rename_is_notified_and_logging_continues() {
        let tmp = TempDir::new().unwrap();
        let (logger, notifier) = open(&tmp, Level::Info);
        let placeholder = logger.log_path();
        // A directory squatting on the bound name makes the rename fail.
        fs::create_dir_all(placeholder.with_file_name("Ledger - Journal.log").join("x")).unwrap();

        logger.bind("Journal").unwrap();
        assert_eq!(notifier.renames.lock().len(), 1);
        assert_eq!(logger.log_path(), placeholder);
        assert_eq!(logger.class_name().as_deref(), Some("Journal"));

        logger.info(&record("still here")).unwrap();
        assert!(contents(&logger).contains("still here"));
    }

    #[test]
    fn unbound_loggers_keep_separate_files() {
        let tmp = TempDir::new().unwrap();
        let (first, _) = open(&tmp, Level::Info);
        first.info(&record("early from first")).unwrap();

        let (second, _) = open(&tmp, Level::Info);
        assert_ne!(first.log_path(), second.log_path());
        assert!(contents(&first).contains("early from first"));

        first.bind("Journal").unwrap();
        second.bind("Accounts").unwrap();
        second.info(&record("from second")).unwrap();

        assert!(first.log_path().ends_with("Ledger - Journal.log"));
        assert!(second.log_path().ends_with("Ledger - Accounts.log"));
        let first_text = contents(&first);
        assert!(first_text.contains("early from first"));
        assert!(!first_text.contains("from second"));
        assert!(contents(&second).contains("from second"));
    }

    #[test]
    fn close_is_idempotent_and_later_writes_are_reported() {
        let tmp = TempDir::new().unwrap();
        let (logger, notifier) = open(&tmp, Level::Info);
        logger.info(&record("before")).unwrap();
        logger.close();
        logger.close();
        assert!(logger.is_closed());

        logger.info(&record("after")).unwrap();
        assert!(!contents(&logger).contains("after"));
        assert_eq!(
            notifier.failures.lock().as_slice(),
            ["Unable to write message to log file".to_string()]
        );
    }

    #[test]
    fn unopenable_log_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("var");
        fs::write(&blocker, "file where a directory belongs").unwrap();

        let (logger, notifier) = open(&tmp, Level::Info);
        assert!(logger.is_closed());
        logger.info(&record("lost")).unwrap();
        assert_eq!(notifier.failures.lock().len(), 2);
    }
}
