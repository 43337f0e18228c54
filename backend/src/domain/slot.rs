//! Slot reservation model.
//!
//! A slot is a time range owned by one user plus a free-text comment. Every
//! slot receives a UUID at creation so `delete` can address it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{UserId, UserValidationError};

/// Validation errors raised while building slots and slot filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValidationError {
    InvalidId,
    InvalidOwner(UserValidationError),
    EndsBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl fmt::Display for SlotValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "slot id must be a valid UUID"),
            Self::InvalidOwner(err) => write!(f, "invalid owner: {err}"),
            Self::EndsBeforeStart { start, end } => write!(
                f,
                "start {} must not be after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            ),
        }
    }
}

impl std::error::Error for SlotValidationError {}

impl From<UserValidationError> for SlotValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidOwner(value)
    }
}

fn ensure_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), SlotValidationError> {
    if start > end {
        return Err(SlotValidationError::EndsBeforeStart { start, end });
    }
    Ok(())
}

/// Stable slot identifier assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(Uuid);

impl SlotId {
    /// Generate a fresh identifier for a new slot.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an identifier read back from storage.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a client supplied identifier.
    ///
    /// # Examples
    /// ```
    /// use slot_service::domain::SlotId;
    ///
    /// assert!(SlotId::parse("9b2f0b8e-3f43-4c86-9f0c-0f1f63f0c0de").is_ok());
    /// assert!(SlotId::parse("slot-1").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, SlotValidationError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| SlotValidationError::InvalidId)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated request to create a slot; the store assigns the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    owner_user_id: UserId,
    comment: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl NewSlot {
    /// Validate the time range and build the draft.
    pub fn try_new(
        owner_user_id: UserId,
        comment: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, SlotValidationError> {
        ensure_ordered(start, end)?;
        Ok(Self {
            owner_user_id,
            comment: comment.into(),
            start,
            end,
        })
    }

    #[must_use]
    pub fn owner_user_id(&self) -> &UserId {
        &self.owner_user_id
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Attach an identity, producing the stored slot.
    #[must_use]
    pub fn with_id(self, id: SlotId) -> Slot {
        Slot {
            id,
            owner_user_id: self.owner_user_id,
            comment: self.comment,
            start: self.start,
            end: self.end,
        }
    }
}

/// Persisted slot reservation.
///
/// ## Invariants
/// - `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "SlotDto", into = "SlotDto")]
pub struct Slot {
    #[schema(value_type = String, example = "9b2f0b8e-3f43-4c86-9f0c-0f1f63f0c0de")]
    id: SlotId,
    #[schema(value_type = String, example = "alpha")]
    owner_user_id: UserId,
    #[schema(example = "Dentist")]
    comment: String,
    #[schema(value_type = String, example = "2024-05-01T09:00:00Z")]
    start: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-05-01T10:00:00Z")]
    end: DateTime<Utc>,
}

impl Slot {
    /// Rebuild a slot from stored parts, re-checking the range invariant.
    pub fn try_new(
        id: SlotId,
        owner_user_id: UserId,
        comment: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, SlotValidationError> {
        NewSlot::try_new(owner_user_id, comment, start, end).map(|draft| draft.with_id(id))
    }

    #[must_use]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[must_use]
    pub fn owner_user_id(&self) -> &UserId {
        &self.owner_user_id
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotDto {
    id: SlotId,
    owner_user_id: String,
    comment: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl From<Slot> for SlotDto {
    fn from(value: Slot) -> Self {
        Self {
            id: value.id,
            owner_user_id: value.owner_user_id.into(),
            comment: value.comment,
            start: value.start,
            end: value.end,
        }
    }
}

impl TryFrom<SlotDto> for Slot {
    type Error = SlotValidationError;

    fn try_from(value: SlotDto) -> Result<Self, Self::Error> {
        let owner = UserId::new(value.owner_user_id)?;
        Self::try_new(value.id, owner, value.comment, value.start, value.end)
    }
}

/// Criteria for the `slots` command.
///
/// A slot matches when every populated bound holds: the owner is equal,
/// the slot starts at or after `start`, and ends at or before `end`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotFilter {
    owner_user_id: Option<UserId>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl SlotFilter {
    /// Filter matching every slot.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter, rejecting an inverted time window.
    pub fn try_new(
        owner_user_id: Option<UserId>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, SlotValidationError> {
        if let (Some(lower), Some(upper)) = (start, end) {
            ensure_ordered(lower, upper)?;
        }
        Ok(Self {
            owner_user_id,
            start,
            end,
        })
    }

    #[must_use]
    pub fn owner_user_id(&self) -> Option<&UserId> {
        self.owner_user_id.as_ref()
    }

    #[must_use]
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Evaluate the filter against one slot.
    #[must_use]
    pub fn matches(&self, slot: &Slot) -> bool {
        self.owner_user_id
            .as_ref()
            .is_none_or(|owner| owner == slot.owner_user_id())
            && self.start.is_none_or(|lower| slot.start() >= lower)
            && self.end.is_none_or(|upper| slot.end() <= upper)
    }
}
