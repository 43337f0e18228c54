//! Domain primitives, services, and ports.
//!
//! Purpose: define strongly typed entities used by the command dispatcher
//! and the persistence adapters, and the use-cases that join them. Nothing
//! in this module depends on actix or Diesel.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure type.
//! - User / UserId: seeded account identity.
//! - Slot / SlotId / NewSlot / SlotFilter: reservation records.
//! - SlotService / UserSeeder: use-cases invoked by inbound adapters and
//!   startup.

pub mod error;
pub mod ports;
pub mod slot;
mod slot_service;
mod trace_id;
pub mod user;
mod user_seeding;

pub use self::error::{Error, ErrorCode, REDACTED_INTERNAL_MESSAGE};
pub use self::slot::{NewSlot, Slot, SlotFilter, SlotId, SlotValidationError};
pub use self::slot_service::{SlotListing, SlotService};
pub use self::trace_id::TraceId;
pub use self::user::{User, UserId, UserValidationError};
pub use self::user_seeding::{SeedingError, SeedingOutcome, UserSeeder, default_users};
