//! Domain ports for the hexagonal boundary.
//!
//! Persistence adapters under `outbound` implement these traits; services in
//! `domain` and handlers in `inbound` depend only on the traits.

mod macros;
pub(crate) use macros::define_port_error;

mod slot_repository;
mod user_repository;

#[cfg(test)]
pub use slot_repository::MockSlotRepository;
pub use slot_repository::{SlotRepository, SlotRepositoryError, SlotScan};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
