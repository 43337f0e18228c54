//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types re-run the
//! domain validation, so a bad row surfaces as a conversion error rather
//! than an invalid value.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{NewSlot, Slot, SlotId, SlotValidationError, User, UserId, UserValidationError};

use super::schema::{slots, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl TryFrom<UserRow> for User {
    type Error = UserValidationError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = UserId::new(row.id)?;
        Ok(User::new(
            id,
            row.first_name,
            row.last_name,
            row.email,
            row.password,
        ))
    }
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: user.id().as_ref(),
            first_name: user.first_name(),
            last_name: user.last_name(),
            email: user.email(),
            password: user.password(),
        }
    }
}

/// Row struct for reading from the slots table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SlotRow {
    pub id: Uuid,
    pub owner_user_id: String,
    pub comment: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl TryFrom<SlotRow> for Slot {
    type Error = SlotValidationError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        let owner = UserId::new(row.owner_user_id)?;
        Slot::try_new(
            SlotId::from_uuid(row.id),
            owner,
            row.comment,
            row.start_at,
            row.end_at,
        )
    }
}

/// Insertable struct for creating slot records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = slots)]
pub(crate) struct NewSlotRow<'a> {
    pub id: Uuid,
    pub owner_user_id: &'a str,
    pub comment: &'a str,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl<'a> NewSlotRow<'a> {
    pub(crate) fn new(id: SlotId, slot: &'a NewSlot) -> Self {
        Self {
            id: *id.as_uuid(),
            owner_user_id: slot.owner_user_id().as_ref(),
            comment: slot.comment(),
            start_at: slot.start(),
            end_at: slot.end(),
        }
    }
}
