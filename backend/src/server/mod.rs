//! Server construction and middleware wiring.

mod lifecycle;

pub use lifecycle::{
    ForceReason, ShutdownOutcome, ShutdownSignal, ShutdownSignals, ShutdownTrigger,
    run_until_stopped,
};

use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use crate::Trace;
use crate::inbound::http::dispatcher::xhr;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::static_files::{StaticRoot, serve};

/// Shared state handed to every worker's `App`.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub static_root: web::Data<StaticRoot>,
}

/// Build the application: probes, the command endpoint, and the static
/// fallback for every other path.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        static_root,
    } = deps;

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(static_root)
        .wrap(Trace)
        .service(ready)
        .service(live)
        .service(xhr)
        .default_service(web::to(serve))
}

/// Construct the HTTP server on an already bound listener.
///
/// Signal handling is left to the caller; see [`run_until_stopped`].
/// Workers force-close connections still open `shutdown_grace` after a
/// graceful stop begins.
///
/// # Errors
/// Propagates [`std::io::Error`] when the listener cannot be adopted.
pub fn create_server(
    deps: AppDependencies,
    listener: TcpListener,
    shutdown_grace: Duration,
) -> std::io::Result<Server> {
    let server = HttpServer::new(move || build_app(deps.clone()))
        .disable_signals()
        .shutdown_timeout(shutdown_grace.as_secs().max(1))
        .listen(listener)?
        .run();
    Ok(server)
}
