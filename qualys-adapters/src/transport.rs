//! Transport seam between the dispatcher and the remote service.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Default request content type for `fo` endpoints.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Content type used by the QPS REST endpoints.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Result alias used by transports.
pub type TransportResult<T> = Result<T, TransportError>;

/// Fully encoded outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireRequest {
    path: String,
    body: String,
    content_type: Option<&'static str>,
    accept: Option<&'static str>,
}

impl WireRequest {
    /// Creates a form-encoded request for `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: body.into(),
            content_type: None,
            accept: None,
        }
    }

    /// Overrides the request content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Sets an explicit `Accept` header.
    #[must_use]
    pub fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = Some(accept);
        self
    }

    /// Returns the path relative to the base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the encoded body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the effective content type.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.content_type.unwrap_or(FORM_CONTENT_TYPE)
    }

    /// Returns the `Accept` header, if one was set.
    #[must_use]
    pub const fn accept(&self) -> Option<&'static str> {
        self.accept
    }

    /// Consumes the request, returning the body.
    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }
}

/// Successful response from the remote service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireResponse {
    status: u16,
    content_type: Option<String>,
    body: Bytes,
}

impl WireResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// `Content-Type` header, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends wire requests to the remote service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] for non-success statuses and for any
    /// failure to complete the exchange.
    async fn send(&self, request: WireRequest) -> TransportResult<WireResponse>;
}

/// Failures surfaced by a [`Transport`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The service answered with a non-success status.
    #[error("{status} {reason}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
        /// Response body as text.
        body: String,
    },

    /// Nothing was listening at the configured endpoint.
    #[error("connection refused by {endpoint}")]
    ConnectionRefused {
        /// Base URL that refused the connection.
        endpoint: String,
    },

    /// The exchange did not complete in time.
    #[error("request timed out after {}s", .after.as_secs())]
    Timeout {
        /// Configured bound.
        after: Duration,
    },

    /// Any other transport failure.
    #[error("{reason}")]
    Request {
        /// Human-readable detail.
        reason: String,
    },

    /// The transport could not be set up from its configuration.
    #[error("transport not configured: {reason}")]
    Configuration {
        /// Human-readable detail.
        reason: String,
    },
}

impl TransportError {
    /// Convenience constructor for generic request failures.
    #[must_use]
    pub fn request(reason: impl Into<String>) -> Self {
        Self::Request {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for configuration failures.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}
