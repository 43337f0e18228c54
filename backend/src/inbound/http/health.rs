//! Health endpoints: liveness and readiness probes for orchestration and load
//! balancers, driven by the process lifecycle phase.
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use tracing::info;

/// Process lifecycle phases, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecyclePhase {
    Starting = 0,
    Seeding = 1,
    Serving = 2,
    Draining = 3,
    Stopped = 4,
}

impl LifecyclePhase {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Seeding,
            2 => Self::Serving,
            3 => Self::Draining,
            _ => Self::Stopped,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Seeding => "seeding",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared health state for readiness and liveness checks.
///
/// Readiness holds only while serving; liveness holds until draining starts
/// so orchestrators stop routing traffic before the listener closes.
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(LifecyclePhase::Starting as u8),
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `next`. Phases only advance; a request to go back is ignored.
    pub fn enter(&self, next: LifecyclePhase) {
        let previous = LifecyclePhase::from_u8(self.phase.fetch_max(next as u8, Ordering::AcqRel));
        if previous < next {
            info!(from = %previous, to = %next, "lifecycle transition");
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        LifecyclePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == LifecyclePhase::Serving
    }

    /// When false, liveness probes emit 503.
    pub fn is_alive(&self) -> bool {
        self.phase() < LifecyclePhase::Draining
    }

    fn probe_response(&self, probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .insert_header(("x-lifecycle-phase", self.phase().as_str()))
            .finish()
    }
}

/// Readiness probe. 200 while serving, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is starting or draining")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    state.probe_response(state.is_ready())
}

/// Liveness probe. 200 until draining starts.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    state.probe_response(state.is_alive())
}
