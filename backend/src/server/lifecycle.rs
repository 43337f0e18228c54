//! Shutdown supervision for the running server.
//!
//! The first SIGINT or SIGTERM moves the process to draining: liveness
//! fails, the listener stops accepting, and in-flight requests get the grace
//! period to finish. A second signal, or grace expiry, abandons the drain.

use std::future::pending;
use std::time::Duration;

use actix_web::dev::Server;
use actix_web::web;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::inbound::http::health::{HealthState, LifecyclePhase};

/// Operating-system request to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Why a drain was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceReason {
    SecondSignal,
    GraceExpired,
}

/// How the server came to a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request finished within the grace period.
    Drained,
    /// The drain was abandoned.
    Forced(ForceReason),
    /// The server stopped on its own, without a signal.
    Exited,
}

impl ShutdownOutcome {
    /// How long to wait for checked-out database connections after the
    /// listener has stopped.
    ///
    /// A forced stop has already spent the grace period, so the pool is
    /// released without waiting.
    pub fn pool_grace(self, grace: Duration) -> Duration {
        match self {
            Self::Forced(_) => Duration::ZERO,
            Self::Drained | Self::Exited => grace,
        }
    }
}

/// Sender half used to inject shutdown signals.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: mpsc::UnboundedSender<ShutdownSignal>,
}

impl ShutdownTrigger {
    /// Deliver `signal`. Ignored once the receiving side is gone.
    pub fn send(&self, signal: ShutdownSignal) {
        let _ = self.tx.send(signal);
    }
}

/// Ordered stream of shutdown requests.
#[derive(Debug)]
pub struct ShutdownSignals {
    rx: mpsc::UnboundedReceiver<ShutdownSignal>,
}

impl ShutdownSignals {
    /// In-process signal source.
    pub fn channel() -> (ShutdownTrigger, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ShutdownTrigger { tx }, Self { rx })
    }

    /// Listen for SIGINT and, on Unix, SIGTERM.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns the I/O error if the SIGTERM handler cannot be installed.
    pub fn install() -> std::io::Result<Self> {
        let (trigger, signals) = Self::channel();

        #[cfg(unix)]
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        tokio::spawn(async move {
            loop {
                #[cfg(unix)]
                let term = terminate.recv();
                #[cfg(not(unix))]
                let term = pending::<Option<()>>();

                let signal = tokio::select! {
                    result = tokio::signal::ctrl_c() => match result {
                        Ok(()) => ShutdownSignal::Interrupt,
                        Err(error) => {
                            warn!(%error, "failed to listen for Ctrl+C");
                            break;
                        }
                    },
                    _ = term => ShutdownSignal::Terminate,
                };
                info!(?signal, "received shutdown signal");
                if trigger.tx.send(signal).is_err() {
                    break;
                }
            }
        });
        Ok(signals)
    }

    /// Next signal. Never resolves once every sender is gone.
    async fn next(&mut self) -> ShutdownSignal {
        match self.rx.recv().await {
            Some(signal) => signal,
            None => pending().await,
        }
    }
}

/// Serve until a shutdown signal arrives, then drain within `grace`.
///
/// Moves `health` through `Draining` and `Stopped`. The caller owns what
/// happens next, typically closing the database pool.
///
/// # Errors
/// Propagates the server's I/O error when it fails on its own.
pub async fn run_until_stopped(
    server: Server,
    mut signals: ShutdownSignals,
    health: web::Data<HealthState>,
    grace: Duration,
) -> std::io::Result<ShutdownOutcome> {
    let handle = server.handle();
    let mut server = std::pin::pin!(server);

    let first = tokio::select! {
        result = &mut server => {
            health.enter(LifecyclePhase::Stopped);
            return result.map(|()| ShutdownOutcome::Exited);
        }
        signal = signals.next() => signal,
    };

    info!(signal = ?first, grace_secs = grace.as_secs(), "draining in-flight requests");
    health.enter(LifecyclePhase::Draining);
    // The stop command is queued immediately; the returned future only
    // reports completion, which `server` resolving already tells us.
    drop(handle.stop(true));

    let outcome = tokio::select! {
        result = &mut server => {
            result?;
            ShutdownOutcome::Drained
        }
        () = sleep(grace) => ShutdownOutcome::Forced(ForceReason::GraceExpired),
        signal = signals.next() => {
            info!(?signal, "second shutdown signal");
            ShutdownOutcome::Forced(ForceReason::SecondSignal)
        }
    };

    if let ShutdownOutcome::Forced(reason) = outcome {
        warn!(?reason, "abandoning drain; stopping immediately");
        drop(handle.stop(false));
    } else {
        info!("drain complete");
    }
    health.enter(LifecyclePhase::Stopped);
    Ok(outcome)
}
