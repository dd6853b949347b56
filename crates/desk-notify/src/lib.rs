//! # desk-notify
//!
//! Reports application errors to an external error tracker.
//!
//! The notifier exists only when a tracker DSN is configured;
//! [`Notifier::from_config`] returns `None` otherwise, and callers hold an
//! `Option` rather than consulting a global switch. Reports carry the
//! environment and app tags, the error's code, messages, and class, the
//! serialized request snapshot and payloads, and a `device` context when a
//! request was captured.

pub mod dsn;
pub mod report;
pub mod transport;

mod error;

pub use dsn::Dsn;
pub use error::NotifyError;
pub use report::Report;
pub use transport::{HttpTransport, MemoryTransport, Transport};

use desk_config::DeskConfig;
use desk_core::{AppError, Notify};
use std::sync::Arc;
use std::time::Duration;

/// Error-tracker notifier.
pub struct Notifier {
    env: String,
    app: String,
    transport: Arc<dyn Transport>,
}

impl Notifier {
    #[must_use]
    pub fn new(env: impl Into<String>, app: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            env: env.into(),
            app: app.into(),
            transport,
        }
    }

    /// Build an HTTP notifier from configuration.
    ///
    /// Returns `Ok(None)` when no DSN is configured.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the DSN is malformed or the client cannot be built.
    pub fn from_config(config: &DeskConfig) -> Result<Option<Self>, NotifyError> {
        if !config.tracker.is_configured() {
            tracing::debug!("tracker: no DSN configured, reporting disabled");
            return Ok(None);
        }

        let dsn = Dsn::parse(&config.tracker.dsn)?;
        let transport = HttpTransport::new(dsn, Duration::from_secs(config.tracker.timeout_secs))?;
        tracing::info!(
            env = %config.general.env,
            app = %config.tracker_app_name(),
            "tracker: reporting enabled"
        );

        Ok(Some(Self::new(
            config.general.env.clone(),
            config.tracker_app_name(),
            Arc::new(transport),
        )))
    }

    #[must_use]
    pub fn env(&self) -> &str {
        &self.env
    }

    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }
}

impl Notify for Notifier {
    fn notify(&self, error: &AppError) {
        let report = Report::from_error(error, &self.env, &self.app);
        tracing::debug!(
            event_id = %report.event_id,
            err_code = error.error_code(),
            kind = %error.kind(),
            "tracker: reporting error"
        );
        self.transport.send(report);
    }
}
