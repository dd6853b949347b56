//! Report delivery.
//!
//! Delivery is fire-and-forget: [`Transport::send`] returns immediately and
//! failures are logged, never returned.

use std::sync::Mutex;
use std::time::Duration;

use crate::dsn::Dsn;
use crate::error::NotifyError;
use crate::report::Report;

/// Client identifier sent with every report.
pub const CLIENT_NAME: &str = concat!("taskdesk/", env!("CARGO_PKG_VERSION"));

/// Media type of an event envelope.
pub const ENVELOPE_CONTENT_TYPE: &str = "application/x-sentry-envelope";

/// Sink for finished reports.
pub trait Transport: Send + Sync {
    fn send(&self, report: Report);
}

/// Posts reports to the tracker's envelope endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    dsn: Dsn,
}

impl HttpTransport {
    /// Build a transport for `dsn`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Client` if the HTTP client fails to build.
    pub fn new(dsn: Dsn, timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .user_agent(CLIENT_NAME)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, dsn })
    }

    #[must_use]
    pub const fn dsn(&self) -> &Dsn {
        &self.dsn
    }
}

impl Transport for HttpTransport {
    fn send(&self, report: Report) {
        let request = self
            .http
            .post(self.dsn.envelope_url())
            .header("X-Sentry-Auth", self.dsn.auth_header(CLIENT_NAME))
            .header("Content-Type", ENVELOPE_CONTENT_TYPE)
            .body(report.to_envelope());
        let event_id = report.event_id;

        let delivery = async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(%event_id, "tracker: report delivered");
                }
                Ok(resp) => {
                    tracing::warn!(%event_id, status = resp.status().as_u16(), "tracker: report rejected");
                }
                Err(error) => {
                    tracing::warn!(%event_id, %error, "tracker: report delivery failed");
                }
            }
        };

        // Outside a runtime (blocking servers, tests) delivery gets its own thread.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(delivery);
        } else {
            std::thread::spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(delivery),
                    Err(error) => tracing::warn!(%error, "tracker: no runtime for delivery"),
                }
            });
        }
    }
}

/// Keeps reports in memory. Used to observe reporting in tests.
#[derive(Default)]
pub struct MemoryTransport {
    reports: Mutex<Vec<Report>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far.
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().map(|reports| reports.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transport for MemoryTransport {
    fn send(&self, report: Report) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report);
        }
    }
}
