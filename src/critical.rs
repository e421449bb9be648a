use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::binder::file_safe;
use crate::compose::{class_of, method_of, render_instant};
use crate::error::LoggerError;
use crate::record::LogRecord;

pub const INCIDENT_SUFFIX: &str = ".err.log";

/// Attempts at disambiguating an incident name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Instant as used inside incident file names: RFC 3339 with the time
/// separators replaced so the name is valid on every platform.
pub fn file_stamp(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H-%M-%S%.3fZ").to_string()
}

/// `<stamp>-<class>.<method>.err.log`
pub fn incident_file_name(record: &LogRecord, instant: &DateTime<Utc>) -> String {
    format!(
        "{}-{}.{}{}",
        file_stamp(instant),
        file_safe(class_of(record)),
        file_safe(method_of(record)),
        INCIDENT_SUFFIX
    )
}

/// Main-log entry pointing at an incident file.
pub fn pointer_line(instant: &DateTime<Utc>, incident: &Path) -> String {
    format!(
        "{}: CRITICAL: See detailed error log at {}",
        render_instant(instant),
        incident.display()
    )
}

/// Writes one file per critical incident into a dedicated directory.
#[derive(Debug, Clone)]
pub struct CriticalDumpWriter {
    dir: PathBuf,
}

impl CriticalDumpWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CriticalDumpWriter { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `report` to a fresh incident file and return its path.
    ///
    /// Missing directories are created. An existing file is never
    /// overwritten: a numeric suffix is inserted before `.err.log` until the
    /// name is free. The handle is flushed and closed before returning, on
    /// success and on failure.
    pub fn write(
        &self,
        record: &LogRecord,
        instant: &DateTime<Utc>,
        report: &str,
    ) -> Result<PathBuf, LoggerError> {
        fs::create_dir_all(&self.dir).map_err(|e| LoggerError::io(&self.dir, e))?;

        let name = incident_file_name(record, instant);
        let stem = name.trim_end_matches(INCIDENT_SUFFIX);
        let mut path = self.dir.join(&name);

        for attempt in 1..=MAX_NAME_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(report.as_bytes())
                        .and_then(|_| file.flush())
                        .map_err(|e| LoggerError::io(&path, e))?;
                    tracing::debug!(path = %path.display(), "critical incident written");
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    path = self
                        .dir
                        .join(format!("{}.{}{}", stem, attempt, INCIDENT_SUFFIX));
                }
                Err(e) => return Err(LoggerError::io(&path, e)),
            }
        }

        Err(LoggerError::io(
            &path,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free incident file name"),
        ))
    }
}
