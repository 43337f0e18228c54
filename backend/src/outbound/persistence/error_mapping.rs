//! Shared Diesel error mapping for the slot and user repositories.
//!
//! Messages produced here reach logs and, for non-internal categories,
//! clients; they never include SQL text or driver detail.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors into `failure` or `connection` constructors.
///
/// `failure` is the query or write constructor matching the operation.
pub(crate) fn map_diesel_error<E>(
    error: diesel::result::Error,
    failure: impl FnOnce(&'static str) -> E,
    connection: impl FnOnce(&'static str) -> E,
) -> E {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            failure("duplicate record")
        }
        DieselError::NotFound => failure("record not found"),
        DieselError::DeserializationError(_) => failure("record could not be decoded"),
        _ => failure("database error"),
    }
}
