//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data`, so they depend only
//! on domain services and stay testable without I/O.

use std::time::Duration;

use crate::domain::SlotService;

/// Dependency bundle for the command dispatcher.
#[derive(Clone)]
pub struct HttpState {
    pub slots: SlotService,
    request_timeout: Duration,
}

impl HttpState {
    /// Bundle the slot service with the bound applied to each store call.
    pub fn new(slots: SlotService, request_timeout: Duration) -> Self {
        Self {
            slots,
            request_timeout,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
