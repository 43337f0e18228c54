//! Test utilities for the service crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled only for tests or with the `test-support` feature.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;

use crate::domain::ports::{
    SlotRepository, SlotRepositoryError, SlotScan, UserRepository, UserRepositoryError,
};
use crate::domain::{NewSlot, Slot, SlotFilter, SlotId, SlotService, User, UserId};
use crate::inbound::http::health::{HealthState, LifecyclePhase};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::static_files::StaticRoot;
use crate::server::AppDependencies;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Failure to inject into the next slot listing.
#[derive(Debug, Clone)]
pub enum ListFailure {
    /// The scan cannot start.
    Unavailable,
    /// The scan stops after `after` rows.
    Interrupt { after: usize },
    /// The scan panics.
    Panic,
}

#[derive(Default)]
struct SlotStore {
    slots: Vec<Slot>,
    next_list_failure: Option<ListFailure>,
    fail_writes: bool,
    delay: Option<Duration>,
}

/// Slot repository held in memory, ordered like the database adapter.
#[derive(Default)]
pub struct InMemorySlotRepository {
    store: Mutex<SlotStore>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `list` call fail.
    pub fn fail_next_list(&self, failure: ListFailure) {
        lock(&self.store).next_list_failure = Some(failure);
    }

    /// Make every insert and delete fail.
    pub fn fail_writes(&self) {
        lock(&self.store).fail_writes = true;
    }

    /// Delay every call by `delay`.
    pub fn delay_calls(&self, delay: Duration) {
        lock(&self.store).delay = Some(delay);
    }

    /// Snapshot of the stored slots.
    pub fn stored(&self) -> Vec<Slot> {
        lock(&self.store).slots.clone()
    }

    async fn pause(&self) {
        let delay = lock(&self.store).delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn count(&self) -> Result<u64, SlotRepositoryError> {
        self.pause().await;
        Ok(lock(&self.store).slots.len() as u64)
    }

    async fn list(&self, filter: &SlotFilter) -> Result<SlotScan, SlotRepositoryError> {
        self.pause().await;
        let mut store = lock(&self.store);
        let mut matching: Vec<Slot> = store
            .slots
            .iter()
            .filter(|slot| filter.matches(slot))
            .cloned()
            .collect();
        matching.sort_by_key(|slot| (slot.start(), *slot.id().as_uuid()));

        let failure = store.next_list_failure.take();
        drop(store);
        match failure {
            None => Ok(SlotScan::complete(matching)),
            Some(ListFailure::Unavailable) => {
                Err(SlotRepositoryError::connection("in-memory store offline"))
            }
            Some(ListFailure::Interrupt { after }) => {
                matching.truncate(after);
                Ok(SlotScan {
                    slots: matching,
                    skipped: 0,
                    interrupted: Some(SlotRepositoryError::query("cursor lost")),
                })
            }
            Some(ListFailure::Panic) => panic!("slot scan panicked"),
        }
    }

    async fn insert(&self, slot: NewSlot) -> Result<Slot, SlotRepositoryError> {
        self.pause().await;
        let mut store = lock(&self.store);
        if store.fail_writes {
            return Err(SlotRepositoryError::write("in-memory store is read-only"));
        }
        let created = slot.with_id(SlotId::random());
        store.slots.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: SlotId) -> Result<bool, SlotRepositoryError> {
        self.pause().await;
        let mut store = lock(&self.store);
        if store.fail_writes {
            return Err(SlotRepositoryError::write("in-memory store is read-only"));
        }
        let before = store.slots.len();
        store.slots.retain(|slot| slot.id() != id);
        Ok(store.slots.len() < before)
    }
}

/// User repository held in memory, keyed by id.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<BTreeMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let repo = Self::new();
        {
            let mut stored = lock(&repo.users);
            for user in users {
                stored.insert(user.id().to_string(), user);
            }
        }
        repo
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn count(&self) -> Result<u64, UserRepositoryError> {
        Ok(lock(&self.users).len() as u64)
    }

    async fn insert_if_absent(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let key: &str = user.id().as_ref();
        let mut users = lock(&self.users);
        if users.contains_key(key) {
            return Ok(false);
        }
        users.insert(user.id().to_string(), user.clone());
        Ok(true)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let key: &str = id.as_ref();
        Ok(lock(&self.users).get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserRepositoryError> {
        Ok(lock(&self.users).values().cloned().collect())
    }
}

/// Directory of front-end assets on disk, removed on drop.
pub struct StaticSite {
    dir: tempfile::TempDir,
}

impl StaticSite {
    /// Site with `index.html` and `static/app.js`.
    pub fn new() -> std::io::Result<Self> {
        let site = Self {
            dir: tempfile::tempdir()?,
        };
        site.write("index.html", "<h1>slots</h1>")?;
        site.write("static/app.js", "console.log('slots')")?;
        Ok(site)
    }

    /// Write `contents` at `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> std::io::Result<()> {
        let root = cap_std::fs::Dir::open_ambient_dir(self.dir.path(), cap_std::ambient_authority())?;
        let path = std::path::Path::new(relative);
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            root.create_dir_all(parent)?;
        }
        root.write(path, contents)
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Open the site as a [`StaticRoot`].
    pub fn root(&self) -> std::io::Result<StaticRoot> {
        StaticRoot::open(self.dir.path())
    }
}

/// Fully wired in-memory application.
pub struct TestHarness {
    pub slots: Arc<InMemorySlotRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub health: web::Data<HealthState>,
    pub site: StaticSite,
    request_timeout: Duration,
}

impl TestHarness {
    /// Harness seeded with the default users and serving.
    pub fn new() -> std::io::Result<Self> {
        let users = crate::domain::default_users()
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        let health = web::Data::new(HealthState::new());
        health.enter(LifecyclePhase::Serving);
        Ok(Self {
            slots: Arc::new(InMemorySlotRepository::new()),
            users: Arc::new(InMemoryUserRepository::with_users(users)),
            health,
            site: StaticSite::new()?,
            request_timeout: Duration::from_secs(5),
        })
    }

    /// Override the per-call store timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Dependencies for [`crate::server::build_app`].
    pub fn dependencies(&self) -> std::io::Result<AppDependencies> {
        let service = SlotService::new(self.slots.clone(), self.users.clone());
        Ok(AppDependencies {
            health_state: self.health.clone(),
            http_state: web::Data::new(HttpState::new(service, self.request_timeout)),
            static_root: web::Data::new(self.site.root()?),
        })
    }
}
