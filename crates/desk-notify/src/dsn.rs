//! Tracker DSN parsing.

use reqwest::Url;

use crate::error::NotifyError;

/// A parsed `scheme://public_key@host[:port]/project_id` DSN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    public_key: String,
    project_id: String,
    base: Url,
}

impl Dsn {
    /// Parse a DSN string.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidDsn` when the URL, key, or project is missing.
    pub fn parse(raw: &str) -> Result<Self, NotifyError> {
        let url = Url::parse(raw.trim()).map_err(|e| NotifyError::InvalidDsn(format!("{e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifyError::InvalidDsn(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let public_key = url.username().to_string();
        if public_key.is_empty() {
            return Err(NotifyError::InvalidDsn("missing public key".into()));
        }

        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let Some(project_id) = segments.pop().map(str::to_string) else {
            return Err(NotifyError::InvalidDsn("missing project id".into()));
        };

        let mut base = url.clone();
        base.set_username("")
            .map_err(|()| NotifyError::InvalidDsn("cannot strip credentials".into()))?;
        base.set_password(None)
            .map_err(|()| NotifyError::InvalidDsn("cannot strip credentials".into()))?;
        base.set_path(&format!("{}/", segments.join("/")));
        base.set_query(None);

        Ok(Self {
            public_key,
            project_id,
            base,
        })
    }

    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Endpoint that accepts event envelopes.
    #[must_use]
    pub fn envelope_url(&self) -> String {
        format!("{}api/{}/envelope/", self.base, self.project_id)
    }

    /// Value of the `X-Sentry-Auth` header.
    #[must_use]
    pub fn auth_header(&self, client: &str) -> String {
        format!(
            "Sentry sentry_version=7, sentry_key={}, sentry_client={client}",
            self.public_key
        )
    }
}
