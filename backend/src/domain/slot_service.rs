//! Slot use-cases behind the command dispatcher.
//!
//! The service validates requests against the stores and translates port
//! errors into transport-agnostic [`Error`] values. It holds no per-request
//! state; one instance is shared by every worker.

use std::sync::Arc;

use tracing::{error, warn};

use crate::domain::ports::{SlotRepository, SlotRepositoryError, UserRepository, UserRepositoryError};
use crate::domain::{Error, NewSlot, Slot, SlotFilter, SlotId, User};

/// Slots returned by a listing, plus the failure that cut it short.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotListing {
    pub slots: Vec<Slot>,
    pub failure: Option<Error>,
}

/// Application service for the slot commands.
#[derive(Clone)]
pub struct SlotService {
    slots: Arc<dyn SlotRepository>,
    users: Arc<dyn UserRepository>,
}

fn map_slot_error(err: SlotRepositoryError) -> Error {
    match err {
        SlotRepositoryError::Connection { message } => {
            warn!(%message, "slot store unavailable");
            Error::service_unavailable("slot store unavailable")
        }
        other @ (SlotRepositoryError::Query { .. } | SlotRepositoryError::Write { .. }) => {
            Error::internal(other.to_string())
        }
    }
}

fn map_user_error(err: UserRepositoryError) -> Error {
    match err {
        UserRepositoryError::Connection { message } => {
            warn!(%message, "user store unavailable");
            Error::service_unavailable("user store unavailable")
        }
        other @ (UserRepositoryError::Query { .. } | UserRepositoryError::Write { .. }) => {
            Error::internal(other.to_string())
        }
    }
}

impl SlotService {
    pub fn new(slots: Arc<dyn SlotRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { slots, users }
    }

    /// List slots matching `filter`.
    ///
    /// # Errors
    /// Fails only when the scan could not start. An interrupted scan is
    /// reported through [`SlotListing::failure`] with the slots read so far.
    pub async fn list_slots(&self, filter: &SlotFilter) -> Result<SlotListing, Error> {
        let scan = self.slots.list(filter).await.map_err(map_slot_error)?;
        if scan.skipped > 0 {
            warn!(skipped = scan.skipped, "slot rows skipped during scan");
        }
        let failure = scan.interrupted.map(|err| {
            error!(error = %err, read = scan.slots.len(), "slot scan interrupted");
            map_slot_error(err)
        });
        Ok(SlotListing {
            slots: scan.slots,
            failure,
        })
    }

    /// Create a slot for an existing user.
    ///
    /// # Errors
    /// [`crate::domain::ErrorCode::InvalidRequest`] when the owner is unknown;
    /// store failures otherwise.
    pub async fn add_slot(&self, draft: NewSlot) -> Result<Slot, Error> {
        let owner = draft.owner_user_id();
        let known = self
            .users
            .find_by_id(owner)
            .await
            .map_err(map_user_error)?;
        if known.is_none() {
            return Err(Error::invalid_request(format!("unknown user: {owner}")));
        }
        self.slots.insert(draft).await.map_err(map_slot_error)
    }

    /// Delete a slot by id.
    ///
    /// # Errors
    /// [`crate::domain::ErrorCode::NotFound`] when no slot has this id.
    pub async fn delete_slot(&self, id: SlotId) -> Result<(), Error> {
        let removed = self.slots.delete(id).await.map_err(map_slot_error)?;
        if removed {
            Ok(())
        } else {
            Err(Error::not_found(format!("slot {id} not found")))
        }
    }

    /// List every known user.
    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.users.list().await.map_err(map_user_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockSlotRepository, MockUserRepository, SlotScan};
    use crate::domain::{ErrorCode, UserId};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn alpha() -> User {
        User::new(
            UserId::new("alpha").expect("valid id"),
            "User",
            "A",
            "a@app.com",
            "omega",
        )
    }

    fn draft(owner: &str) -> NewSlot {
        let start = Utc
            .with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
            .single()
            .expect("timestamp");
        NewSlot::try_new(UserId::new(owner).expect("valid id"), "review", start, start)
            .expect("valid draft")
    }

    fn service(slots: MockSlotRepository, users: MockUserRepository) -> SlotService {
        SlotService::new(Arc::new(slots), Arc::new(users))
    }

    #[rstest]
    #[tokio::test]
    async fn add_rejects_unknown_owner_without_writing() {
        let mut slots = MockSlotRepository::new();
        slots.expect_insert().never();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let err = service(slots, users)
            .add_slot(draft("ghost"))
            .await
            .expect_err("unknown owner");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert!(err.message().contains("ghost"));
    }

    #[rstest]
    #[tokio::test]
    async fn add_inserts_for_known_owner() {
        let mut slots = MockSlotRepository::new();
        slots
            .expect_insert()
            .times(1)
            .returning(|slot| Ok(slot.with_id(SlotId::random())));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(Some(alpha())));

        let slot = service(slots, users)
            .add_slot(draft("alpha"))
            .await
            .expect("slot created");
        assert_eq!(slot.owner_user_id().to_string(), "alpha");
    }

    #[rstest]
    #[tokio::test]
    async fn delete_reports_missing_slot_as_not_found() {
        let mut slots = MockSlotRepository::new();
        slots.expect_delete().returning(|_| Ok(false));
        let err = service(slots, MockUserRepository::new())
            .delete_slot(SlotId::random())
            .await
            .expect_err("missing slot");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_write_failure_is_distinct_from_not_found() {
        let mut slots = MockSlotRepository::new();
        slots
            .expect_delete()
            .returning(|_| Err(SlotRepositoryError::write("deadlock detected")));
        let err = service(slots, MockUserRepository::new())
            .delete_slot(SlotId::random())
            .await
            .expect_err("write failure");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failures_map_to_service_unavailable() {
        let mut slots = MockSlotRepository::new();
        slots
            .expect_list()
            .returning(|_| Err(SlotRepositoryError::connection("refused")));
        let err = service(slots, MockUserRepository::new())
            .list_slots(&SlotFilter::all())
            .await
            .expect_err("unavailable");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert!(!err.message().contains("refused"));
    }

    #[rstest]
    #[tokio::test]
    async fn interrupted_scan_keeps_partial_results() {
        let mut slots = MockSlotRepository::new();
        slots.expect_list().returning(|_| {
            let partial = draft("alpha").with_id(SlotId::random());
            Ok(SlotScan {
                slots: vec![partial],
                skipped: 1,
                interrupted: Some(SlotRepositoryError::query("cursor closed")),
            })
        });
        let listing = service(slots, MockUserRepository::new())
            .list_slots(&SlotFilter::all())
            .await
            .expect("scan started");
        assert_eq!(listing.slots.len(), 1);
        let failure = listing.failure.expect("interruption reported");
        assert_eq!(failure.code(), ErrorCode::InternalError);
    }
}
