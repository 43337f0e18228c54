//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the command endpoint, its envelopes and payloads,
//! and the health probes. It is exported via `cargo run --bin openapi-dump`
//! for external tooling.

use utoipa::OpenApi;

use crate::domain::{ErrorCode, Slot, User};
use crate::inbound::http::envelope::{
    AddSlotRequest, DeleteSlotRequest, ReplyStatus, RequestEnvelope, ResponseEnvelope,
    SlotFilterRequest,
};

/// OpenAPI document for the HTTP interface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Slot reservation API",
        description = "Command endpoint for listing, adding and deleting slots, plus health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::dispatcher::xhr,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        RequestEnvelope,
        ResponseEnvelope,
        ReplyStatus,
        ErrorCode,
        SlotFilterRequest,
        AddSlotRequest,
        DeleteSlotRequest,
        Slot,
        User
    )),
    tags(
        (name = "commands", description = "Envelope-based slot commands"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
