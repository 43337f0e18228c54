//! First-run seeding of the default users.
//!
//! Seeding runs when the `users` collection is empty. Each user is written
//! with an insert-if-absent keyed on the id, so a restart racing another
//! instance cannot duplicate them.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{User, UserId, UserValidationError};

/// Users written to an empty store: `(id, first, last, email, password)`.
const DEFAULT_USERS: [(&str, &str, &str, &str, &str); 2] = [
    ("alpha", "User", "A", "a@app.com", "omega"),
    ("beta", "User", "B", "b@app.com", "omicron"),
];

/// Result of a seeding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedingOutcome {
    /// Users were present already; nothing was written.
    AlreadyPopulated { existing: u64 },
    /// The store was empty; `inserted` users were written.
    Applied { inserted: usize },
}

/// Errors raised while seeding.
#[derive(Debug, Error)]
pub enum SeedingError {
    /// A built-in user failed validation.
    #[error("default user is invalid: {0}")]
    InvalidDefaultUser(#[from] UserValidationError),
    /// The user store rejected a read or write.
    #[error("user seeding persistence error: {0}")]
    Persistence(#[from] UserRepositoryError),
}

/// Build the default users.
///
/// # Errors
/// Only if the built-in table holds an invalid id.
pub fn default_users() -> Result<Vec<User>, UserValidationError> {
    DEFAULT_USERS
        .iter()
        .map(|(id, first, last, email, password)| {
            UserId::new(*id).map(|id| User::new(id, *first, *last, *email, *password))
        })
        .collect()
}

/// Service that seeds the user collection on first run.
#[derive(Clone)]
pub struct UserSeeder {
    users: Arc<dyn UserRepository>,
}

impl UserSeeder {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Seed the default users when the user collection is empty.
    ///
    /// # Errors
    /// Returns [`SeedingError`] when counting or inserting fails.
    pub async fn seed_if_empty(&self) -> Result<SeedingOutcome, SeedingError> {
        let existing = self.users.count().await?;
        if existing > 0 {
            info!(existing, "users present; seeding skipped");
            return Ok(SeedingOutcome::AlreadyPopulated { existing });
        }

        let mut inserted = 0;
        for user in default_users()? {
            if self.users.insert_if_absent(&user).await? {
                inserted += 1;
            }
        }
        info!(inserted, "default users seeded");
        Ok(SeedingOutcome::Applied { inserted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockUserRepository;
    use rstest::rstest;

    #[rstest]
    fn default_users_are_alpha_and_beta() {
        let users = default_users().expect("valid defaults");
        let ids: Vec<&str> = users.iter().map(|user| user.id().as_ref()).collect();
        assert_eq!(ids, ["alpha", "beta"]);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_store_receives_two_users() {
        let mut repo = MockUserRepository::new();
        repo.expect_count().returning(|| Ok(0));
        repo.expect_insert_if_absent().times(2).returning(|_| Ok(true));

        let outcome = UserSeeder::new(Arc::new(repo))
            .seed_if_empty()
            .await
            .expect("seeding succeeds");
        assert_eq!(outcome, SeedingOutcome::Applied { inserted: 2 });
    }

    #[rstest]
    #[tokio::test]
    async fn populated_store_is_left_alone() {
        let mut repo = MockUserRepository::new();
        repo.expect_count().returning(|| Ok(2));
        repo.expect_insert_if_absent().never();

        let outcome = UserSeeder::new(Arc::new(repo))
            .seed_if_empty()
            .await
            .expect("seeding succeeds");
        assert_eq!(outcome, SeedingOutcome::AlreadyPopulated { existing: 2 });
    }

    #[rstest]
    #[tokio::test]
    async fn write_failures_surface_as_persistence_errors() {
        let mut repo = MockUserRepository::new();
        repo.expect_count().returning(|| Ok(0));
        repo.expect_insert_if_absent()
            .returning(|_| Err(UserRepositoryError::write("disk full")));

        let err = UserSeeder::new(Arc::new(repo))
            .seed_if_empty()
            .await
            .expect_err("write fails");
        assert!(matches!(err, SeedingError::Persistence(_)));
    }
}
