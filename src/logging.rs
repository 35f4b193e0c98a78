//! Subscriber setup and request-scoped logging.

use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Installs the global subscriber: `EnvFilter` from the configured level,
/// written to the log file when one is set, stdout otherwise.
pub fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&settings.log_level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
            if settings.log_json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        None if settings.log_json => builder.json().try_init(),
        None => builder.try_init(),
    };
    installed.map_err(anyhow::Error::msg)
}

/// Request-scoped logger.
///
/// Obtained from [`Ctx::log`](crate::Ctx::log); borrows the context's request
/// id and attaches it to every event. Tokens and salts are [`Secret`]s and
/// print as `[REDACTED]` if passed in.
///
/// [`Secret`]: crate::Secret
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
}

impl<'a> RequestLog<'a> {
    /// Creates a logger for `request_id`.
    pub fn new(request_id: &'a str) -> Self {
        Self { request_id }
    }

    /// Request id attached to every event.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs at info level.
    ///
    /// ```no_run
    /// # use scoring_api::{RequestLog, Secret};
    /// let log = RequestLog::new("4f2a");
    /// let token = Secret::new("deadbeef");
    /// log.info(format_args!("rejected token {}", token));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, "{}", args);
    }

    /// Logs at warn level.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, "{}", args);
    }

    /// Logs at error level.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, "{}", args);
    }

    /// Logs at debug level.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, "{}", args);
    }
}
