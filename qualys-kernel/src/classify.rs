//! Dispatch failures and their user-facing rendering.

use qualys_adapters::TransportError;
use qualys_tools::ToolError;
use thiserror::Error;

/// Remediation text returned when credentials are not configured.
pub const MISSING_CREDENTIALS_MESSAGE: &str =
    "QUALYS_USERNAME and QUALYS_PASSWORD environment variables must be set";

/// Message returned when nothing accepts connections at the base URL.
pub const CONNECTION_REFUSED_MESSAGE: &str =
    "Cannot connect to the Qualys API: connection refused. Check QUALYS_BASE_URL.";

/// Result alias for dispatch steps.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Everything that can go wrong between receiving a call and producing its
/// result.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Username or password is missing.
    #[error("{}", MISSING_CREDENTIALS_MESSAGE)]
    MissingCredentials,

    /// No operation is registered under the requested name.
    #[error("Unknown tool: {name}")]
    UnknownOperation {
        /// Requested name.
        name: String,
    },

    /// Arguments failed binding or a handler rejected a value.
    #[error(transparent)]
    Validation(#[from] ToolError),

    /// The request could not be completed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request body could not be produced.
    #[error("failed to encode request: {reason}")]
    Encoding {
        /// Human-readable detail.
        reason: String,
    },
}

impl DispatchError {
    /// Creates an unknown-operation error.
    #[must_use]
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation { name: name.into() }
    }
}

/// Renders a failure as the message shown to the caller.
///
/// Upstream responses show status and body, refused connections get a fixed
/// hint, other transport failures are marked as request errors, and local
/// failures are marked as unknown errors. Missing credentials and unknown
/// operations have their own fixed wording.
#[must_use]
pub fn classify(error: &DispatchError) -> String {
    match error {
        DispatchError::Transport(TransportError::Status {
            status,
            reason,
            body,
        }) => format!("Qualys API error: {status} {reason} - {body}"),
        DispatchError::Transport(TransportError::ConnectionRefused { .. }) => {
            CONNECTION_REFUSED_MESSAGE.to_owned()
        }
        DispatchError::Transport(
            err @ (TransportError::Timeout { .. } | TransportError::Request { .. }),
        ) => format!("Request error: {err}"),
        DispatchError::MissingCredentials | DispatchError::UnknownOperation { .. } => {
            error.to_string()
        }
        other => format!("Unknown error: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn upstream_status_includes_code_and_body() {
        let err = DispatchError::from(TransportError::Status {
            status: 401,
            reason: "Unauthorized".into(),
            body: "<SIMPLE_RETURN>Bad Login/Password</SIMPLE_RETURN>".into(),
        });
        let message = classify(&err);
        assert!(message.contains("401"));
        assert!(message.contains("Unauthorized"));
        assert!(message.contains("Bad Login/Password"));
    }

    #[test]
    fn refused_connection_uses_fixed_message() {
        let err = DispatchError::from(TransportError::ConnectionRefused {
            endpoint: "https://qualysapi.qualys.com".into(),
        });
        assert_eq!(classify(&err), CONNECTION_REFUSED_MESSAGE);
    }

    #[test]
    fn transport_failures_are_request_errors() {
        let timeout = DispatchError::from(TransportError::Timeout {
            after: Duration::from_secs(30),
        });
        assert_eq!(classify(&timeout), "Request error: request timed out after 30s");

        let dns = DispatchError::from(TransportError::request("dns error: no such host"));
        assert_eq!(classify(&dns), "Request error: dns error: no such host");
    }

    #[test]
    fn local_failures_are_unknown_errors() {
        let err = DispatchError::from(ToolError::missing_argument("scan_ref"));
        let message = classify(&err);
        assert_eq!(message, "Unknown error: scan_ref is required");
        assert!(!message.starts_with("Request error"));

        let err = DispatchError::from(TransportError::configuration("bad header"));
        assert!(classify(&err).starts_with("Unknown error: "));
    }

    #[test]
    fn fixed_texts_for_credentials_and_unknown_tools() {
        assert_eq!(
            classify(&DispatchError::MissingCredentials),
            MISSING_CREDENTIALS_MESSAGE
        );
        assert_eq!(
            classify(&DispatchError::unknown_operation("list_everything")),
            "Unknown tool: list_everything"
        );
    }
}
