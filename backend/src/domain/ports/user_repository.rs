//! Port abstraction for the `users` collection and its errors.
use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection => "user repository connection failed: {message}",
        /// Query failed during execution.
        Query => "user repository query failed: {message}",
        /// Insert failed during execution.
        Write => "user repository write failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Number of stored users.
    async fn count(&self) -> Result<u64, UserRepositoryError>;

    /// Insert the user unless a record with the same id exists.
    ///
    /// Returns `true` when a row was written.
    async fn insert_if_absent(&self, user: &User) -> Result<bool, UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<User>, UserRepositoryError>;
}
