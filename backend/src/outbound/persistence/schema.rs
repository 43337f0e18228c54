//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Seeded user accounts keyed by an opaque string id.
    users (id) {
        id -> Text,
        first_name -> Text,
        last_name -> Text,
        email -> Text,
        password -> Text,
    }
}

diesel::table! {
    /// Slot reservations. `owner_user_id` is not a foreign key; rows written
    /// by other tools may reference unknown users.
    slots (id) {
        id -> Uuid,
        owner_user_id -> Text,
        comment -> Text,
        start_at -> Timestamptz,
        end_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, slots);
