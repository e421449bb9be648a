use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::LoggerError;

pub const LOG_EXTENSION: &str = ".log";

/// Stands in for the class name until a logger is bound.
pub const UNBOUND_TOKEN: &str = "null";

/// Placeholder names tried before giving up on opening an unbound log.
const MAX_PLACEHOLDER_ATTEMPTS: u32 = 100;

/// Replace characters that are not valid in file names on every platform.
pub(crate) fn file_safe(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Directory layout under the host's local-storage root:
/// `var/log/` for per-class logs and `var/err/` for critical incidents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLayout {
    pub log_dir: PathBuf,
    pub err_dir: PathBuf,
    pub app_name: String,
}

impl LogLayout {
    pub fn new(root: impl AsRef<Path>, app_name: impl Into<String>) -> Self {
        let var = root.as_ref().join("var");
        LogLayout {
            log_dir: var.join("log"),
            err_dir: var.join("err"),
            app_name: app_name.into(),
        }
    }

    /// `<App> - null.log`
    pub fn placeholder_path(&self) -> PathBuf {
        self.log_path_for(UNBOUND_TOKEN)
    }

    /// `<App> - null.<n>.log`, the name tried when the plain placeholder is
    /// held by another logger.
    pub fn numbered_placeholder_path(&self, n: u32) -> PathBuf {
        self.log_path_for(&format!("{}.{}", UNBOUND_TOKEN, n))
    }

    /// `<App> - <ClassName>.log`
    pub fn bound_path(&self, class_name: &str) -> PathBuf {
        self.log_path_for(class_name)
    }

    fn log_path_for(&self, class_name: &str) -> PathBuf {
        self.log_dir.join(format!(
            "{} - {}{}",
            file_safe(&self.app_name),
            file_safe(class_name),
            LOG_EXTENSION
        ))
    }
}

/// Whether a logger has been associated with its owning class yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBinding {
    Unbound {
        placeholder: PathBuf,
    },
    Bound {
        class_name: String,
        /// Where the log file currently lives. Equals the bound path once the
        /// rename succeeded, stays at the placeholder otherwise.
        path: PathBuf,
    },
}

/// Result of moving the log file to its bound name.
#[derive(Debug)]
pub enum RenameOutcome {
    Renamed { from: PathBuf, to: PathBuf },
    AlreadyInPlace(PathBuf),
    Failed { from: PathBuf, to: PathBuf, error: io::Error },
}

/// Two-state lifecycle of a log file name: opened under a placeholder, then
/// bound once to a class name and renamed. There is no way back to unbound.
#[derive(Debug, Clone)]
pub struct LogFileBinder {
    layout: LogLayout,
    state: LogBinding,
}

impl LogFileBinder {
    /// Unbound binder at the plain placeholder name. Touches nothing on
    /// disk; [`LogFileBinder::open`] is the way to claim a file.
    pub fn new(layout: LogLayout) -> Self {
        let placeholder = layout.placeholder_path();
        LogFileBinder {
            layout,
            state: LogBinding::Unbound { placeholder },
        }
    }

    /// Create the log directory and claim a placeholder file no other
    /// logger holds. An existing placeholder is never truncated: the name
    /// gets a numeric suffix until a free one is found.
    pub fn open(layout: LogLayout) -> Result<(Self, File), LoggerError> {
        fs::create_dir_all(&layout.log_dir).map_err(|e| LoggerError::io(&layout.log_dir, e))?;

        let mut placeholder = layout.placeholder_path();
        for attempt in 1..=MAX_PLACEHOLDER_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(&placeholder) {
                Ok(file) => {
                    let binder = LogFileBinder {
                        layout,
                        state: LogBinding::Unbound { placeholder },
                    };
                    return Ok((binder, file));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    placeholder = layout.numbered_placeholder_path(attempt);
                }
                Err(e) => return Err(LoggerError::io(&placeholder, e)),
            }
        }

        Err(LoggerError::io(
            &placeholder,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free placeholder log name"),
        ))
    }

    pub fn layout(&self) -> &LogLayout {
        &self.layout
    }

    pub fn state(&self) -> &LogBinding {
        &self.state
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.state {
            LogBinding::Unbound { .. } => None,
            LogBinding::Bound { class_name, .. } => Some(class_name),
        }
    }

    /// Path the log file is currently stored under.
    pub fn current_path(&self) -> &Path {
        match &self.state {
            LogBinding::Unbound { placeholder } => placeholder,
            LogBinding::Bound { path, .. } => path,
        }
    }

    /// Record the owning class. Allowed exactly once; the file keeps its
    /// placeholder name until [`LogFileBinder::update_log_name`] runs.
    pub fn set_class_name(&mut self, class_name: &str) -> Result<(), LoggerError> {
        if class_name.trim().is_empty() {
            return Err(LoggerError::InvalidArgument(
                "class name must not be blank".to_string(),
            ));
        }

        match &self.state {
            LogBinding::Bound { class_name: bound, .. } => Err(LoggerError::InvalidState(
                format!("logger already bound to class {}", bound),
            )),
            LogBinding::Unbound { placeholder } => {
                self.state = LogBinding::Bound {
                    class_name: class_name.to_string(),
                    path: placeholder.clone(),
                };
                Ok(())
            }
        }
    }

    /// Rename the log file from where it lives to `<App> - <ClassName>.log`.
    ///
    /// A failed rename is not an error: the outcome reports it and the file
    /// stays where it was.
    pub fn update_log_name(&mut self) -> Result<RenameOutcome, LoggerError> {
        let (class_name, path) = match &mut self.state {
            LogBinding::Unbound { .. } => {
                return Err(LoggerError::InvalidState(
                    "no class name bound to this logger".to_string(),
                ))
            }
            LogBinding::Bound { class_name, path } => (class_name, path),
        };

        let target = self.layout.bound_path(class_name);
        if *path == target {
            return Ok(RenameOutcome::AlreadyInPlace(target));
        }

        match std::fs::rename(&*path, &target) {
            Ok(()) => {
                let from = std::mem::replace(path, target.clone());
                Ok(RenameOutcome::Renamed { from, to: target })
            }
            Err(error) => Ok(RenameOutcome::Failed {
                from: path.clone(),
                to: target,
                error,
            }),
        }
    }

    /// Set the class name and rename the file in one step.
    pub fn bind(&mut self, class_name: &str) -> Result<RenameOutcome, LoggerError> {
        self.set_class_name(class_name)?;
        self.update_log_name()
    }
}
