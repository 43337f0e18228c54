//! Port abstraction for the `slots` collection.
use async_trait::async_trait;

use crate::domain::{NewSlot, Slot, SlotFilter, SlotId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by slot repository adapters.
    pub enum SlotRepositoryError {
        /// Repository connection could not be established.
        Connection => "slot repository connection failed: {message}",
        /// A read failed or was interrupted.
        Query => "slot repository query failed: {message}",
        /// An insert or delete failed.
        Write => "slot repository write failed: {message}",
    }
}

/// Outcome of a single pass over matching slots.
///
/// Rows that could not be decoded into a valid [`Slot`] are counted in
/// `skipped` and left out. When the underlying cursor fails part-way,
/// `interrupted` holds the failure and `slots` keeps what was read before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotScan {
    pub slots: Vec<Slot>,
    pub skipped: usize,
    pub interrupted: Option<SlotRepositoryError>,
}

impl SlotScan {
    /// Scan that completed without skips or interruption.
    #[must_use]
    pub fn complete(slots: Vec<Slot>) -> Self {
        Self {
            slots,
            ..Self::default()
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Number of stored slots.
    async fn count(&self) -> Result<u64, SlotRepositoryError>;

    /// Scan slots matching `filter`, ordered by start time then id.
    ///
    /// Returns `Err` only when the scan could not start.
    async fn list(&self, filter: &SlotFilter) -> Result<SlotScan, SlotRepositoryError>;

    /// Store a new slot under a freshly assigned identifier.
    async fn insert(&self, slot: NewSlot) -> Result<Slot, SlotRepositoryError>;

    /// Remove a slot. Returns `true` when a row was removed.
    async fn delete(&self, id: SlotId) -> Result<bool, SlotRepositoryError>;
}
