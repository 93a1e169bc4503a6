//! Shared plumbing for the HTTP-backed providers.
//!
//! The collaborator traits in `ecoroute-core` are synchronous so the core
//! stays embeddable anywhere. Each provider owns an [`HttpBridge`] that runs
//! its async `reqwest` calls to completion, reusing the caller's runtime when
//! it is multi-threaded and falling back to a private current-thread runtime
//! otherwise.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

/// Default user agent for outgoing requests.
pub const DEFAULT_USER_AGENT: &str = "ecoroute/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while constructing an HTTP provider.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Errors raised by a single HTTP exchange.
///
/// URLs carried here never include query strings, so API keys stay out of
/// logs.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint that was called.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("{url} answered with HTTP {status}")]
    Status {
        /// Endpoint that was called.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The response body could not be decoded.
    #[error("could not decode response from {url}")]
    Decode {
        /// Endpoint that was called.
        url: String,
        /// Underlying decoding failure.
        #[source]
        source: reqwest::Error,
    },
    /// The service could not be reached.
    #[error("request to {url} failed")]
    Network {
        /// Endpoint that was called.
        url: String,
        /// Underlying transport failure.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub(crate) fn classify(source: reqwest::Error, url: &str, timeout: Duration) -> Self {
        let url = url.to_owned();
        if source.is_timeout() {
            return Self::Timeout {
                url,
                timeout_secs: timeout.as_secs(),
            };
        }
        if let Some(status) = source.status() {
            return Self::Status {
                url,
                status: status.as_u16(),
            };
        }
        if source.is_decode() {
            return Self::Decode { url, source };
        }
        Self::Network { url, source }
    }
}

/// Connection settings shared by every HTTP provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProviderConfig {
    /// Base URL of the service, without a trailing path.
    pub base_url: String,
    /// Connect and request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl HttpProviderConfig {
    /// Create a configuration for `base_url` with default timeout and agent.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// `path` joined onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// An HTTP client paired with the runtime that drives it.
pub(crate) struct HttpBridge {
    client: Client,
    runtime: Runtime,
    timeout: Duration,
}

impl std::fmt::Debug for HttpBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBridge")
            .field("client", &self.client)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpBridge {
    pub(crate) fn new(config: &HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            runtime,
            timeout: config.timeout,
        })
    }

    pub(crate) const fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn classify(&self, source: reqwest::Error, url: &str) -> FetchError {
        FetchError::classify(source, url, self.timeout)
    }

    /// Drive `future` to completion from synchronous code.
    ///
    /// Inside a `current_thread` runtime this falls back to the private
    /// runtime, which blocks the caller's executor for the duration.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}
