//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{User, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn connection_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

fn query_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(error, UserRepositoryError::query, UserRepositoryError::connection)
}

/// Decode rows into users, dropping the ones that fail validation.
fn decode_users(rows: Vec<UserRow>) -> Vec<User> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            User::try_from(row)
                .inspect_err(|error| warn!(user_id = %id, %error, "skipping invalid user row"))
                .ok()
        })
        .collect()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn count(&self) -> Result<u64, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;
        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(query_error)?;
        u64::try_from(total).map_err(|_| UserRepositoryError::query("negative user count"))
    }

    async fn insert_if_absent(&self, user: &User) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;
        let written = diesel::insert_into(users::table)
            .values(&NewUserRow::from(user))
            .on_conflict(users::id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|err| {
                map_diesel_error(err, UserRepositoryError::write, UserRepositoryError::connection)
            })?;
        Ok(written > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;
        let key: &str = id.as_ref();
        let row = users::table
            .filter(users::id.eq(key))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(query_error)?;

        row.map(User::try_from)
            .transpose()
            .map_err(|err| UserRepositoryError::query(format!("stored user is invalid: {err}")))
    }

    async fn list(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;
        let rows = users::table
            .select(UserRow::as_select())
            .order(users::id.asc())
            .load::<UserRow>(&mut conn)
            .await
            .map_err(query_error)?;
        Ok(decode_users(rows))
    }
}
