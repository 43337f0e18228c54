//! Command dispatcher behind `POST /xhr`.
//!
//! The body is decoded into a [`RequestEnvelope`], the `command` string picks
//! a handler, and the outcome is folded into a [`ResponseEnvelope`]. Every
//! reply is HTTP 200 with a JSON body; failures are signalled in the
//! envelope. A panicking command is caught and reported as an internal error
//! for that request alone.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::time::Duration;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpResponse, post, web};
use futures_util::{FutureExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, NewSlot, SlotFilter, SlotId, UserId};
use crate::inbound::http::cache_control::{JSON_UTF8, no_cache_header, nosniff_header};
use crate::inbound::http::envelope::{
    AddSlotRequest, DeleteSlotRequest, RequestEnvelope, ResponseEnvelope, SlotFilterRequest,
};
use crate::inbound::http::state::HttpState;

/// Commands understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Slots,
    Add,
    Delete,
    Users,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "slots" => Ok(Self::Slots),
            "add" => Ok(Self::Add),
            "delete" => Ok(Self::Delete),
            "users" => Ok(Self::Users),
            other => Err(Error::unknown_command(format!("unknown command: {other}"))),
        }
    }
}

/// Largest request body `/xhr` will buffer.
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// Owner filter value that lists every user's slots.
const ALL_OWNERS: &str = "all";

/// Result of one command before it is put on the wire.
#[derive(Debug)]
enum Outcome {
    Done(Value),
    Failed(Error),
    /// Failure that still yields the data read before it.
    Partial { error: Error, data: Value },
}

impl From<Result<Value, Error>> for Outcome {
    fn from(result: Result<Value, Error>) -> Self {
        match result {
            Ok(data) => Self::Done(data),
            Err(error) => Self::Failed(error),
        }
    }
}

/// Execute one command envelope.
#[utoipa::path(
    post,
    path = "/xhr",
    request_body = RequestEnvelope,
    responses(
        (status = 200, description = "Command outcome", body = ResponseEnvelope)
    ),
    tags = ["commands"]
)]
#[post("/xhr")]
pub async fn xhr(state: web::Data<HttpState>, payload: web::Payload) -> HttpResponse {
    let envelope = match decode_envelope(payload).await {
        Ok(envelope) => envelope,
        Err(error) => {
            warn!(error = %error, "rejected undecodable request");
            return reply(&ResponseEnvelope::failure(&error));
        }
    };

    let name = envelope.command.clone();
    let outcome = AssertUnwindSafe(dispatch(&state, envelope))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            error!(command = %name, panic = panic_message(panic.as_ref()), "command panicked");
            Outcome::Failed(Error::internal("command panicked"))
        });

    let envelope = match outcome {
        Outcome::Done(data) => ResponseEnvelope::ok(data),
        Outcome::Failed(error) => {
            log_failure(&name, &error);
            ResponseEnvelope::failure(&error)
        }
        Outcome::Partial { error, data } => {
            log_failure(&name, &error);
            ResponseEnvelope::partial(&error, data)
        }
    };
    reply(&envelope)
}

fn decoding_failed(reason: impl std::fmt::Display) -> Error {
    Error::invalid_request(format!("request decoding failed: {reason}"))
}

/// Buffer at most [`MAX_BODY_BYTES`] and decode the envelope.
async fn decode_envelope(mut payload: web::Payload) -> Result<RequestEnvelope, Error> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(decoding_failed)?;
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(decoding_failed(format!(
                "body exceeds {MAX_BODY_BYTES} bytes"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    serde_json::from_slice(&body).map_err(decoding_failed)
}

fn reply(envelope: &ResponseEnvelope) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response
        .insert_header((CONTENT_TYPE, JSON_UTF8))
        .insert_header(no_cache_header())
        .insert_header(nosniff_header());
    match serde_json::to_vec(envelope) {
        Ok(body) => response.body(body),
        Err(err) => {
            error!(error = %err, "failed to encode response envelope");
            response.body(r#"{"status":"error","error":"Internal server error","code":"internal_error"}"#)
        }
    }
}

fn log_failure(command: &str, error: &Error) {
    match error.code() {
        ErrorCode::InternalError | ErrorCode::ServiceUnavailable => {
            error!(command, code = error.code().as_str(), error = %error, "command failed");
        }
        _ => warn!(command, code = error.code().as_str(), error = %error, "command rejected"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

async fn dispatch(state: &HttpState, envelope: RequestEnvelope) -> Outcome {
    let command = match envelope.command.parse::<Command>() {
        Ok(command) => command,
        Err(error) => return Outcome::Failed(error),
    };
    let RequestEnvelope { user, data, .. } = envelope;
    match command {
        Command::Slots => list_slots(state, &user, data).await,
        Command::Add => add_slot(state, &user, data).await.into(),
        Command::Delete => delete_slot(state, data).await.into(),
        Command::Users => list_users(state).await.into(),
    }
}

/// Bound a store call by the request timeout.
async fn bounded<T>(limit: Duration, call: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        Err(Error::service_unavailable(format!(
            "store did not answer within {}ms",
            limit.as_millis()
        )))
    })
}

fn decode_data<T: DeserializeOwned>(command: &str, data: Value) -> Result<T, Error> {
    serde_json::from_value(data)
        .map_err(|err| Error::invalid_request(format!("invalid data for {command}: {err}")))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| Error::internal(format!("encoding reply: {err}")))
}

fn parse_user_id(raw: String) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

/// Build the listing filter. Without an explicit owner the requesting user's
/// slots are listed, unless the user is empty or `all`.
fn slot_filter(user: &str, data: Value) -> Result<SlotFilter, Error> {
    let request = if data.is_null() {
        SlotFilterRequest::default()
    } else {
        decode_data::<SlotFilterRequest>("slots", data)?
    };
    let owner = match request.owner_user_id {
        Some(owner) => Some(owner),
        None if user.is_empty() || user == ALL_OWNERS => None,
        None => Some(user.to_owned()),
    };
    let owner = owner.map(parse_user_id).transpose()?;
    SlotFilter::try_new(owner, request.start, request.end)
        .map_err(|err| Error::invalid_request(err.to_string()))
}

async fn list_slots(state: &HttpState, user: &str, data: Value) -> Outcome {
    let filter = match slot_filter(user, data) {
        Ok(filter) => filter,
        Err(error) => return Outcome::Failed(error),
    };
    let listing = match bounded(state.request_timeout(), state.slots.list_slots(&filter)).await {
        Ok(listing) => listing,
        Err(error) => return Outcome::Failed(error),
    };
    let data = match encode(&listing.slots) {
        Ok(data) => data,
        Err(error) => return Outcome::Failed(error),
    };
    match listing.failure {
        None => Outcome::Done(data),
        Some(error) => Outcome::Partial { error, data },
    }
}

async fn add_slot(state: &HttpState, user: &str, data: Value) -> Result<Value, Error> {
    let request = decode_data::<AddSlotRequest>("add", data)?;
    let owner = match request.owner_user_id {
        Some(owner) => owner,
        None if !user.is_empty() => user.to_owned(),
        None => return Err(Error::invalid_request("slot owner is required")),
    };
    let draft = NewSlot::try_new(
        parse_user_id(owner)?,
        request.comment,
        request.start,
        request.end,
    )
    .map_err(|err| Error::invalid_request(err.to_string()))?;
    let slot = bounded(state.request_timeout(), state.slots.add_slot(draft)).await?;
    encode(&slot)
}

async fn delete_slot(state: &HttpState, data: Value) -> Result<Value, Error> {
    let request = decode_data::<DeleteSlotRequest>("delete", data)?;
    let id = SlotId::parse(&request.id).map_err(|err| Error::invalid_request(err.to_string()))?;
    bounded(state.request_timeout(), state.slots.delete_slot(id)).await?;
    Ok(Value::Bool(true))
}

async fn list_users(state: &HttpState) -> Result<Value, Error> {
    let users = bounded(state.request_timeout(), state.slots.list_users()).await?;
    encode(&users)
}
