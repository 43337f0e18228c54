//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP adapter folds them into the
//! `{status: "error"}` response envelope; nothing here knows about status
//! codes or headers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TraceId;

/// Message substituted for internal failures before they reach clients.
pub const REDACTED_INTERNAL_MESSAGE: &str = "Internal server error";

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request body could not be decoded or failed validation.
    InvalidRequest,
    /// The envelope named a command the dispatcher does not know.
    UnknownCommand,
    /// The addressed record does not exist.
    NotFound,
    /// The store could not be reached or did not answer in time.
    ServiceUnavailable,
    /// An unexpected failure inside the service or the store.
    InternalError,
}

impl ErrorCode {
    /// Wire representation, identical to the serde encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnknownCommand => "unknown_command",
            Self::NotFound => "not_found",
            Self::ServiceUnavailable => "service_unavailable",
            Self::InternalError => "internal_error",
        }
    }
}

/// Domain error payload.
///
/// Captures the trace identifier in scope at construction time so the error
/// can be correlated with request logs.
///
/// # Examples
/// ```
/// use slot_service::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("slot not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), "slot not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
}

impl Error {
    /// Create a new error, capturing the current trace identifier.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Trace identifier captured when the error was raised.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Attach a trace identifier explicitly.
    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Copy of this error that is safe to show to clients.
    ///
    /// Internal failures lose their message; every other category is
    /// returned unchanged.
    #[must_use]
    pub fn redacted(&self) -> Self {
        if matches!(self.code, ErrorCode::InternalError) {
            Self {
                code: ErrorCode::InternalError,
                message: REDACTED_INTERNAL_MESSAGE.to_owned(),
                trace_id: self.trace_id.clone(),
            }
        } else {
            self.clone()
        }
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::UnknownCommand`].
    pub fn unknown_command(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownCommand, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorCode::InvalidRequest)]
    #[case(ErrorCode::UnknownCommand)]
    #[case(ErrorCode::NotFound)]
    #[case(ErrorCode::ServiceUnavailable)]
    #[case(ErrorCode::InternalError)]
    fn as_str_matches_serde_encoding(#[case] code: ErrorCode) {
        let encoded = serde_json::to_value(code).expect("serialise code");
        assert_eq!(encoded.as_str(), Some(code.as_str()));
    }

    #[rstest]
    fn redaction_hides_internal_messages() {
        let err = Error::internal("connection reset by peer").with_trace_id("abc");
        let redacted = err.redacted();
        assert_eq!(redacted.message(), REDACTED_INTERNAL_MESSAGE);
        assert_eq!(redacted.trace_id(), Some("abc"));
    }

    #[rstest]
    fn redaction_keeps_client_errors() {
        let err = Error::not_found("slot not found");
        assert_eq!(err.redacted(), err);
    }

    #[tokio::test]
    async fn captures_trace_id_in_scope() {
        let trace_id = TraceId::generate();
        let err = TraceId::scope(trace_id, async { Error::invalid_request("bad") }).await;
        assert_eq!(err.trace_id(), Some(trace_id.to_string().as_str()));
    }
}
