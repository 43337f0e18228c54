//! Service entry-point: loads settings, prepares the store, serves until a
//! shutdown signal, then drains and releases the pool.

use std::ffi::OsString;
use std::net::TcpListener;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use slot_service::config::{AppSettings, RuntimeSettings};
use slot_service::domain::{SlotService, UserSeeder};
use slot_service::inbound::http::health::{HealthState, LifecyclePhase};
use slot_service::inbound::http::state::HttpState;
use slot_service::inbound::http::static_files::StaticRoot;
use slot_service::outbound::persistence::{PersistenceGateway, PoolConfig, run_migrations};
use slot_service::server::{AppDependencies, ShutdownSignals, create_server, run_until_stopped};

fn load_settings(args: impl IntoIterator<Item = OsString>) -> Result<RuntimeSettings> {
    let settings =
        AppSettings::load_from_iter(args).map_err(|err| eyre!("failed to load settings: {err}"))?;
    settings.resolve().wrap_err("invalid settings")
}

async fn seed_users(gateway: &PersistenceGateway) {
    match UserSeeder::new(gateway.user_repository()).seed_if_empty().await {
        Ok(outcome) => info!(?outcome, "user seeding finished"),
        Err(error) => warn!(%error, "user seeding failed; continuing startup"),
    }
}

async fn report_slot_count(gateway: &PersistenceGateway) {
    match gateway.slot_repository().count().await {
        Ok(slots) => info!(slots, "slot store ready"),
        Err(error) => warn!(%error, "failed to count stored slots"),
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let health = web::Data::new(HealthState::new());
    let settings = load_settings(std::env::args_os())?;
    info!(
        bind_addr = %settings.bind_addr,
        static_root = %settings.static_root.display(),
        "starting slot service"
    );

    let pool_config = PoolConfig::new(settings.database_url.clone())
        .with_max_size(settings.pool_max_size)
        .with_connection_timeout(settings.connect_timeout);
    let gateway = PersistenceGateway::connect(pool_config)
        .await
        .wrap_err("database unreachable")?;
    run_migrations(&settings.database_url)
        .await
        .wrap_err("failed to apply database migrations")?;

    health.enter(LifecyclePhase::Seeding);
    seed_users(&gateway).await;
    report_slot_count(&gateway).await;

    let static_root = StaticRoot::open(&settings.static_root).wrap_err_with(|| {
        format!(
            "failed to open static root {}",
            settings.static_root.display()
        )
    })?;
    let service = SlotService::new(gateway.slot_repository(), gateway.user_repository());
    let deps = AppDependencies {
        health_state: health.clone(),
        http_state: web::Data::new(HttpState::new(service, settings.request_timeout)),
        static_root: web::Data::new(static_root),
    };
    let listener = TcpListener::bind(settings.bind_addr)
        .wrap_err_with(|| format!("failed to bind {}", settings.bind_addr))?;
    let server = create_server(deps, listener, settings.shutdown_grace)?;
    let signals = ShutdownSignals::install().wrap_err("failed to install signal handlers")?;

    health.enter(LifecyclePhase::Serving);
    let outcome = run_until_stopped(server, signals, health.clone(), settings.shutdown_grace)
        .await
        .wrap_err("server failed")?;
    info!(?outcome, "listener stopped");

    gateway
        .close(outcome.pool_grace(settings.shutdown_grace))
        .await;
    info!("slot service stopped");
    Ok(())
}
