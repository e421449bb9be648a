use std::io;
use std::path::Path;

/// Host-side collaborator told about failures the logger recovers from.
///
/// The logger never propagates I/O faults to its caller. Instead it hands
/// them to a notifier: rename failures are meant for the user (a desktop
/// host shows a warning dialog), everything else lands on a fallback error
/// stream.
pub trait HostNotifier: Send + Sync {
    /// The log file could not be moved to its bound name.
    ///
    /// Logging continues under `from`.
    fn rename_failed(&self, from: &Path, to: &Path, error: &io::Error) {
        eprintln!(
            "Unsuccessful Rename: log file\n\t{}\nwas not able to be renamed to:\n\t{}\n({})",
            from.display(),
            to.display(),
            error
        );
    }

    /// An open, write, flush or close failed. `context` names the
    /// operation and `payload` is the text that may have been lost.
    fn io_failure(&self, context: &str, path: &Path, error: &io::Error, payload: Option<&str>) {
        match payload {
            Some(text) => eprintln!(
                "{} {}: {}\nMessage: {}",
                context,
                path.display(),
                error,
                text
            ),
            None => eprintln!("{} {}: {}", context, path.display(), error),
        }
    }
}

/// Default notifier: every notice goes to standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrNotifier;

impl HostNotifier for StderrNotifier {}

/// A notifier that swallows every notice.
///
/// Useful for hosts that watch the `tracing` diagnostics instead, and for
/// tests that provoke failures on purpose.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl HostNotifier for NoopNotifier {
    fn rename_failed(&self, _from: &Path, _to: &Path, _error: &io::Error) {}

    fn io_failure(&self, _context: &str, _path: &Path, _error: &io::Error, _payload: Option<&str>) {}
}
