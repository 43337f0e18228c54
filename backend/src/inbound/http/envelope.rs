//! Wire types for the `/xhr` command endpoint.
//!
//! One request envelope names a command and carries its payload; one
//! response envelope reports the outcome. Command payloads are decoded from
//! `data` only after the command has been recognised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode};

/// Command request as posted by the browser.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequestEnvelope {
    /// Opaque identifier of the acting user.
    #[serde(default)]
    pub user: String,
    pub command: String,
    /// Command-specific payload.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Outcome marker of a [`ResponseEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// Command reply.
///
/// `error` and `code` are present exactly when `status` is `error`. `data`
/// accompanies a failure only when a listing was cut short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResponseEnvelope {
    pub status: ReplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    pub fn ok(data: Value) -> Self {
        Self {
            status: ReplyStatus::Ok,
            error: None,
            code: None,
            data: Some(data),
        }
    }

    /// Failure reply. Internal messages are redacted here.
    pub fn failure(error: &Error) -> Self {
        let shown = error.redacted();
        Self {
            status: ReplyStatus::Error,
            error: Some(shown.message().to_owned()),
            code: Some(shown.code()),
            data: None,
        }
    }

    /// Failure reply that still carries the data gathered before it.
    pub fn partial(error: &Error, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::failure(error)
        }
    }
}

/// `data` of the `slots` command. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotFilterRequest {
    pub owner_user_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// `data` of the `add` command.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSlotRequest {
    /// Defaults to the envelope's `user`.
    pub owner_user_id: Option<String>,
    #[serde(default)]
    pub comment: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// `data` of the `delete` command.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteSlotRequest {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn user_and_data_are_optional() {
        let envelope: RequestEnvelope =
            serde_json::from_value(json!({"command": "users"})).expect("decodes");
        assert_eq!(envelope.user, "");
        assert!(envelope.data.is_null());
    }

    #[rstest]
    fn ok_reply_omits_error_fields() {
        let body = serde_json::to_value(ResponseEnvelope::ok(json!([]))).expect("encodes");
        assert_eq!(body, json!({"status": "ok", "data": []}));
    }

    #[rstest]
    fn internal_failures_are_redacted() {
        let body = serde_json::to_value(ResponseEnvelope::failure(&Error::internal(
            "relation \"slots\" does not exist",
        )))
        .expect("encodes");
        assert_eq!(
            body,
            json!({
                "status": "error",
                "error": "Internal server error",
                "code": "internal_error"
            })
        );
    }

    #[rstest]
    fn partial_reply_keeps_data() {
        let reply = ResponseEnvelope::partial(&Error::service_unavailable("gone"), json!([1]));
        assert_eq!(reply.status, ReplyStatus::Error);
        assert_eq!(reply.code, Some(ErrorCode::ServiceUnavailable));
        assert_eq!(reply.data, Some(json!([1])));
    }

    #[rstest]
    fn add_request_uses_camel_case() {
        let request: AddSlotRequest = serde_json::from_value(json!({
            "ownerUserId": "alpha",
            "start": "2024-05-01T09:00:00Z",
            "end": "2024-05-01T10:00:00Z"
        }))
        .expect("decodes");
        assert_eq!(request.owner_user_id.as_deref(), Some("alpha"));
        assert_eq!(request.comment, "");
    }
}
