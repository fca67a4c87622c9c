use crate::{config::SlingServerConfiguration, errors::SlingError};
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str =
    concat!("sling-support/", env!("CARGO_PKG_VERSION"));

/// Handle representing an active association between this process and
/// one Sling server configuration.
///
/// Construction validates the endpoint and allocates the HTTP
/// connection pool the handle will communicate through; a handle that
/// exists is always usable. Dropping the handle releases the pool.
/// Remote operations are deliberately not part of this type — callers
/// drive the pooled client obtained from [`SlingSupport::http_client`].
pub struct SlingSupport {
    config: SlingServerConfiguration,
    base_url: Url,
    http: reqwest::Client,
}

impl SlingSupport {
    pub fn new(
        config: SlingServerConfiguration,
    ) -> Result<Self, SlingError> {
        if config.machine_name.trim().is_empty() {
            return Err(SlingError::ConfigurationError(format!(
                "Server '{}' has an empty machine name",
                config.name
            )));
        }
        if config.port == 0 {
            return Err(SlingError::ConfigurationError(format!(
                "Server '{}' has port 0",
                config.name
            )));
        }

        let raw = config.base_url();
        let base_url = Url::parse(&raw).map_err(|e| {
            SlingError::ConfigurationError(format!(
                "Server '{}' endpoint '{}' is not a valid URL: {}",
                config.name, raw, e
            ))
        })?;
        // Url::parse will happily swallow "host:port" strings where the
        // host parsed as a scheme; require the host to survive parsing.
        let host_matches = base_url
            .host_str()
            .is_some_and(|h| h.eq_ignore_ascii_case(&config.machine_name));
        if !host_matches {
            return Err(SlingError::ConfigurationError(format!(
                "Server '{}' machine name '{}' is not a valid host",
                config.name, config.machine_name
            )));
        }

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout_duration(config.timeout) {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        debug!(server = %config.name, url = %base_url, "Constructed Sling client handle");
        Ok(Self {
            config,
            base_url,
            http,
        })
    }

    /// The configuration this handle is bound to.
    pub fn server_config(&self) -> &SlingServerConfiguration {
        &self.config
    }

    pub fn server_name(&self) -> &str {
        &self.config.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_active(&self) -> bool {
        self.config.active
    }

    /// The pooled HTTP client allocated at construction. Transport
    /// layers built on top of this crate issue their requests through
    /// it so connections to the server are reused.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    #[inline]
    pub fn retry_attempts(&self) -> u32 {
        self.config.retry_attempts.max(1)
    }

    #[inline]
    pub fn timeout_duration(&self) -> Option<Duration> {
        timeout_duration(self.config.timeout)
    }
}

impl std::fmt::Debug for SlingSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlingSupport")
            .field("server", &self.config.name)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

fn timeout_duration(seconds: Option<u64>) -> Option<Duration> {
    seconds.and_then(|s| {
        if s == 0 {
            None
        } else {
            Some(Duration::from_secs(s))
        }
    })
}
