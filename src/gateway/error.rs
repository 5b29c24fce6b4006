//! Gateway call errors.
//!
//! Every failed call lands in exactly one class:
//! - `Unreachable`: no connection to the backend was made. Nothing was sent,
//!   so any call may be retried.
//! - `Interrupted`: the request went out but no answer came back (timeout,
//!   reset). The backend may have applied it; only idempotent calls retry.
//! - `Application`: the backend answered and rejected the call. Surface as-is.
//! - `Decode`: the backend answered 2xx with a body we cannot read.
//! - `Request`: the call could not be issued at all.

use reqwest::StatusCode;

/// Header the dev gateway sets on error responses it generates itself.
pub const GATEWAY_ERROR_HEADER: &str = "x-gateway-error";

/// [`GATEWAY_ERROR_HEADER`] value: the backend refused or dropped the connection attempt.
pub const UNREACHABLE: &str = "unreachable";

/// [`GATEWAY_ERROR_HEADER`] value: the connection failed after the request was forwarded.
pub const INTERRUPTED: &str = "interrupted";

/// [`GATEWAY_ERROR_HEADER`] value: the backend did not answer within the deadline.
pub const TIMED_OUT: &str = "timeout";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("backend unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("backend did not answer, outcome unknown: {reason}")]
    Interrupted { reason: String },

    #[error("backend rejected request ({status}): {message}")]
    Application { status: StatusCode, message: String },

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("failed to issue request: {0}")]
    Request(String),
}

impl GatewayError {
    /// Classify a response the dev gateway generated, by its error header value.
    pub fn from_gateway_tag(tag: &str, reason: String) -> Option<Self> {
        match tag {
            UNREACHABLE => Some(GatewayError::Unreachable { reason }),
            INTERRUPTED | TIMED_OUT => Some(GatewayError::Interrupted { reason }),
            _ => None,
        }
    }

    /// Safe to retry whatever the call: the backend never saw it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Unreachable { .. })
    }

    /// Whether a call with this outcome may be issued again.
    ///
    /// A non-idempotent call that was interrupted may already have been
    /// applied, so it is only retried when it never left.
    pub fn may_retry(&self, idempotent: bool) -> bool {
        match self {
            GatewayError::Unreachable { .. } => true,
            GatewayError::Interrupted { .. } => idempotent,
            _ => false,
        }
    }

    /// Network-level failure of either kind.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            GatewayError::Unreachable { .. } | GatewayError::Interrupted { .. }
        )
    }

    /// True for 4xx rejections: the request itself was wrong.
    pub fn is_client_error(&self) -> bool {
        matches!(self, GatewayError::Application { status, .. } if status.is_client_error())
    }

    /// True when the backend rejected the call with 409.
    pub fn is_conflict(&self) -> bool {
        matches!(self, GatewayError::Application { status, .. } if *status == StatusCode::CONFLICT)
    }

    /// True when the backend rejected the call with 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Application { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        let reason = err.to_string();
        if err.is_builder() || err.is_redirect() {
            GatewayError::Request(reason)
        } else if err.is_connect() {
            GatewayError::Unreachable { reason }
        } else if err.is_decode() {
            GatewayError::Decode(reason)
        } else {
            // Timeouts, resets and body read failures happen after the request left.
            GatewayError::Interrupted { reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let unreachable = GatewayError::Unreachable {
            reason: "connection refused".into(),
        };
        assert!(unreachable.is_retryable());
        assert!(!unreachable.is_client_error());
        assert_eq!(unreachable.status(), None);

        let conflict = GatewayError::Application {
            status: StatusCode::CONFLICT,
            message: "collection exists".into(),
        };
        assert!(!conflict.is_retryable());
        assert!(conflict.is_client_error());
        assert!(conflict.is_conflict());

        let server = GatewayError::Application {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "boom".into(),
        };
        assert!(!server.is_retryable());
        assert!(!server.is_client_error());
    }

    #[test]
    fn interrupted_calls_retry_only_when_idempotent() {
        let interrupted = GatewayError::Interrupted {
            reason: "timed out".into(),
        };
        assert!(interrupted.is_network());
        assert!(!interrupted.is_retryable());
        assert!(interrupted.may_retry(true));
        assert!(!interrupted.may_retry(false));

        let unreachable = GatewayError::Unreachable {
            reason: "connection refused".into(),
        };
        assert!(unreachable.may_retry(false));
    }

    #[test]
    fn gateway_tags() {
        assert!(matches!(
            GatewayError::from_gateway_tag(UNREACHABLE, "x".into()),
            Some(GatewayError::Unreachable { .. })
        ));
        assert!(matches!(
            GatewayError::from_gateway_tag(TIMED_OUT, "x".into()),
            Some(GatewayError::Interrupted { .. })
        ));
        assert!(matches!(
            GatewayError::from_gateway_tag(INTERRUPTED, "x".into()),
            Some(GatewayError::Interrupted { .. })
        ));
        assert!(GatewayError::from_gateway_tag("other", "x".into()).is_none());
    }

    #[test]
    fn builder_errors_are_not_network_failures() {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        let err = GatewayError::from(err);
        assert!(matches!(err, GatewayError::Request(_)), "{err}");
        assert!(!err.is_network());
        assert!(!err.may_retry(true));
    }

    #[test]
    fn message_is_verbatim() {
        let err = GatewayError::Application {
            status: StatusCode::BAD_REQUEST,
            message: "question must not be empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "backend rejected request (400 Bad Request): question must not be empty"
        );
    }
}
