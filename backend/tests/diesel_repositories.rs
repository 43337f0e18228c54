//! Diesel adapters against a live PostgreSQL database.
//!
//! Set `SLOTS_TEST_DATABASE_URL` to a disposable database to run these
//! tests; without it they log a skip marker and pass. Each test works on
//! rows keyed by fresh identifiers, so suites can share one database.

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};
use slot_service::domain::ports::{SlotRepository, UserRepository};
use slot_service::domain::{NewSlot, SlotFilter, SlotId, User, UserId};
use slot_service::outbound::persistence::{
    DbPool, DieselSlotRepository, DieselUserRepository, PoolConfig, run_migrations,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

#[fixture]
fn database_url() -> Option<String> {
    match std::env::var("SLOTS_TEST_DATABASE_URL") {
        Ok(url) if !url.is_empty() => Some(url),
        _ => {
            eprintln!("SKIP-TEST-DATABASE: SLOTS_TEST_DATABASE_URL is unset");
            None
        }
    }
}

async fn pool(url: &str) -> DbPool {
    SCHEMA
        .get_or_init(|| async {
            run_migrations(url).await.expect("migrations apply");
        })
        .await;
    DbPool::connect(PoolConfig::new(url).with_max_size(2))
        .await
        .expect("test database reachable")
}

fn fresh_owner() -> UserId {
    UserId::new(format!("owner-{}", Uuid::new_v4())).expect("valid id")
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn draft(owner: &UserId, start: DateTime<Utc>, end: DateTime<Utc>) -> NewSlot {
    NewSlot::try_new(owner.clone(), "integration", start, end).expect("valid slot")
}

#[rstest]
#[tokio::test]
async fn listing_filters_by_owner_and_window_in_start_order(database_url: Option<String>) {
    let Some(url) = database_url else { return };
    let repo = DieselSlotRepository::new(pool(&url).await);
    let owner = fresh_owner();
    let other = fresh_owner();
    for (who, start, end) in [
        (&owner, at(1, 14), at(1, 15)),
        (&other, at(1, 10), at(1, 11)),
        (&owner, at(1, 8), at(1, 9)),
        (&owner, at(2, 8), at(2, 9)),
    ] {
        repo.insert(draft(who, start, end)).await.expect("insert");
    }

    let filter = SlotFilter::try_new(Some(owner.clone()), Some(at(1, 0)), Some(at(2, 0)))
        .expect("filter");
    let scan = repo.list(&filter).await.expect("list");

    let starts: Vec<DateTime<Utc>> = scan.slots.iter().map(|slot| slot.start()).collect();
    assert_eq!(starts, [at(1, 8), at(1, 14)]);
    assert!(scan.slots.iter().all(|slot| slot.owner_user_id() == &owner));
    assert_eq!(scan.skipped, 0);
    assert!(scan.interrupted.is_none());
}

#[rstest]
#[tokio::test]
async fn inserted_slot_round_trips_and_deletes_once(database_url: Option<String>) {
    let Some(url) = database_url else { return };
    let repo = DieselSlotRepository::new(pool(&url).await);
    let owner = fresh_owner();

    let created = repo
        .insert(draft(&owner, at(3, 9), at(3, 10)))
        .await
        .expect("insert");
    let filter = SlotFilter::try_new(Some(owner.clone()), None, None).expect("filter");
    let listed = repo.list(&filter).await.expect("list");
    assert_eq!(listed.slots, [created.clone()]);

    assert!(repo.delete(created.id()).await.expect("first delete"));
    assert!(!repo.delete(created.id()).await.expect("second delete"));
    assert!(repo.list(&filter).await.expect("list").slots.is_empty());
}

#[rstest]
#[tokio::test]
async fn deleting_unknown_slot_reports_nothing_removed(database_url: Option<String>) {
    let Some(url) = database_url else { return };
    let repo = DieselSlotRepository::new(pool(&url).await);

    let removed = repo.delete(SlotId::random()).await.expect("delete");

    assert!(!removed);
}

#[rstest]
#[tokio::test]
async fn insert_if_absent_keeps_the_first_user(database_url: Option<String>) {
    let Some(url) = database_url else { return };
    let repo = DieselUserRepository::new(pool(&url).await);
    let id = fresh_owner();
    let first = User::new(id.clone(), "First", "Writer", "first@app.com", "one");
    let second = User::new(id.clone(), "Second", "Writer", "second@app.com", "two");

    assert!(repo.insert_if_absent(&first).await.expect("first insert"));
    assert!(!repo.insert_if_absent(&second).await.expect("second insert"));

    let stored = repo.find_by_id(&id).await.expect("lookup").expect("user exists");
    assert_eq!(stored.first_name(), "First");
    assert!(repo
        .list()
        .await
        .expect("list")
        .iter()
        .any(|user| user.id() == &id));
}

#[rstest]
#[tokio::test]
async fn unknown_user_is_absent(database_url: Option<String>) {
    let Some(url) = database_url else { return };
    let repo = DieselUserRepository::new(pool(&url).await);

    let found = repo.find_by_id(&fresh_owner()).await.expect("lookup");

    assert!(found.is_none());
}
