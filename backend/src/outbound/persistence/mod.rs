//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL through `diesel-async` with `bb8` pooling. Diesel row structs
//! and the schema stay private to this module.
//!
//! # Example
//!
//! ```ignore
//! use slot_service::outbound::persistence::{PersistenceGateway, PoolConfig};
//!
//! let gateway = PersistenceGateway::connect(PoolConfig::new("postgres://localhost/slots")).await?;
//! let slots = gateway.slot_repository();
//! ```

mod diesel_slot_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

use std::sync::Arc;
use std::time::Duration;

pub use diesel_slot_repository::DieselSlotRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

use crate::domain::ports::{SlotRepository, UserRepository};

/// Live connection to the store plus the repositories built on it.
#[derive(Clone)]
pub struct PersistenceGateway {
    pool: DbPool,
    slots: Arc<DieselSlotRepository>,
    users: Arc<DieselUserRepository>,
}

impl PersistenceGateway {
    /// Connect to the store, failing if it does not answer within the
    /// configured connection timeout.
    ///
    /// # Errors
    /// Returns [`PoolError::Build`] when the store is unreachable.
    pub async fn connect(config: PoolConfig) -> Result<Self, PoolError> {
        let pool = DbPool::connect(config).await?;
        Ok(Self {
            slots: Arc::new(DieselSlotRepository::new(pool.clone())),
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            pool,
        })
    }

    pub fn slot_repository(&self) -> Arc<dyn SlotRepository> {
        self.slots.clone()
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    /// Drop the repositories and release the pool within `grace`.
    pub async fn close(self, grace: Duration) {
        let Self { pool, slots, users } = self;
        drop(slots);
        drop(users);
        pool.close(grace).await;
    }
}
