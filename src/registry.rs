use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LoggerConfig;
use crate::environment::{AppInfo, EnvironmentSnapshot};
use crate::error::LoggerError;
use crate::logger::Logger;
use crate::notifier::{HostNotifier, StderrNotifier};

/// One [`Logger`] per owning class.
///
/// `logger_for` hands out the logger already registered for a class, or
/// opens a new one and binds it before anyone else can see it. Creation is
/// serialized, so two classes never race on the shared placeholder file.
pub struct LoggerRegistry {
    config: LoggerConfig,
    env: Arc<EnvironmentSnapshot>,
    notifier: Arc<dyn HostNotifier>,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    pub fn new(config: LoggerConfig) -> Self {
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

    pub fn with_collaborators(
        config: LoggerConfig,
        env: Arc<EnvironmentSnapshot>,
        notifier: Arc<dyn HostNotifier>,
    ) -> Self {
        LoggerRegistry {
            config,
            env,
            notifier,
            loggers: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Logger bound to `class_name`, created on first request.
    pub fn logger_for(&self, class_name: &str) -> Result<Arc<Logger>, LoggerError> {
        if class_name.trim().is_empty() {
            return Err(LoggerError::InvalidArgument(
                "class name must not be blank".to_string(),
            ));
        }

        let mut loggers = self.loggers.lock();
        if let Some(existing) = loggers.get(class_name) {
            return Ok(Arc::clone(existing));
        }

        let logger = Arc::new(Logger::with_collaborators(
            &self.config,
            Arc::clone(&self.env),
            Arc::clone(&self.notifier),
        ));
        logger.bind(class_name)?;
        loggers.insert(class_name.to_string(), Arc::clone(&logger));
        tracing::debug!(class = class_name, "logger registered");
        Ok(logger)
    }

    pub fn get(&self, class_name: &str) -> Option<Arc<Logger>> {
        self.loggers.lock().get(class_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.loggers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.lock().is_empty()
    }

    /// Close every registered logger, typically at host shutdown.
    pub fn close_all(&self) {
        for logger in self.loggers.lock().values() {
            logger.close();
        }
    }
}
