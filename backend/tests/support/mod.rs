//! Shared helpers for the HTTP integration tests.
//!
//! Each integration test compiles as its own crate, so helpers live here and
//! are pulled in with `mod support;`.

#![allow(dead_code, reason = "not every test crate uses every helper")]

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::HeaderMap;
use actix_web::test as actix_test;
use serde_json::{Value, json};

/// Build a request envelope.
pub fn envelope(user: &str, command: &str, data: Value) -> Value {
    json!({ "user": user, "command": command, "data": data })
}

/// Reply to a raw `/xhr` call.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// POST `body` verbatim to `/xhr`.
pub async fn post_raw<S>(app: &S, body: impl Into<String>) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = actix_test::TestRequest::post()
        .uri("/xhr")
        .insert_header(("content-type", "application/json"))
        .set_payload(body.into())
        .to_request();
    let response = actix_test::call_service(app, request).await;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = actix_test::read_body(response).await;
    let body = serde_json::from_slice(&bytes).expect("reply is JSON");
    Reply {
        status,
        headers,
        body,
    }
}

/// POST an envelope to `/xhr` and return the reply body.
pub async fn send<S>(app: &S, user: &str, command: &str, data: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    post_raw(app, envelope(user, command, data).to_string())
        .await
        .body
}

/// Payload for an `add` command.
pub fn slot_data(owner: &str, comment: &str, start: &str, end: &str) -> Value {
    json!({ "ownerUserId": owner, "comment": comment, "start": start, "end": end })
}

/// Header value as a string slice, if present and visible ASCII.
pub fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
