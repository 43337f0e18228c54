//! PostgreSQL-backed adapter for the `slots` collection.
//!
//! Listing streams rows off the cursor one at a time. A row that fails to
//! deserialise, or decodes into an invalid slot, is logged and skipped; a
//! cursor failure ends the scan but keeps the slots already decoded.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use futures_util::{Stream, StreamExt, pin_mut};
use tracing::warn;

use crate::domain::ports::{SlotRepository, SlotRepositoryError, SlotScan};
use crate::domain::{NewSlot, Slot, SlotFilter, SlotId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewSlotRow, SlotRow};
use super::pool::{DbPool, PoolError};
use super::schema::slots;

/// Diesel-backed implementation of [`SlotRepository`].
#[derive(Clone)]
pub struct DieselSlotRepository {
    pool: DbPool,
}

impl DieselSlotRepository {
    /// Create a repository backed by `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn connection_error(error: PoolError) -> SlotRepositoryError {
    map_pool_error(error, SlotRepositoryError::connection)
}

fn query_error(error: diesel::result::Error) -> SlotRepositoryError {
    map_diesel_error(error, SlotRepositoryError::query, SlotRepositoryError::connection)
}

fn write_error(error: diesel::result::Error) -> SlotRepositoryError {
    map_diesel_error(error, SlotRepositoryError::write, SlotRepositoryError::connection)
}

/// Drain a row stream into a [`SlotScan`].
pub(crate) async fn collect_scan<S>(rows: S) -> SlotScan
where
    S: Stream<Item = Result<SlotRow, diesel::result::Error>>,
{
    pin_mut!(rows);
    let mut scan = SlotScan::default();
    while let Some(item) = rows.next().await {
        match item {
            Ok(row) => {
                let id = row.id;
                match Slot::try_from(row) {
                    Ok(slot) => scan.slots.push(slot),
                    Err(error) => {
                        warn!(slot_id = %id, %error, "skipping invalid slot row");
                        scan.skipped += 1;
                    }
                }
            }
            Err(diesel::result::Error::DeserializationError(error)) => {
                warn!(%error, "skipping undecodable slot row");
                scan.skipped += 1;
            }
            Err(error) => {
                scan.interrupted = Some(query_error(error));
                break;
            }
        }
    }
    scan
}

#[async_trait]
impl SlotRepository for DieselSlotRepository {
    async fn count(&self) -> Result<u64, SlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;
        let total: i64 = slots::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(query_error)?;
        u64::try_from(total).map_err(|_| SlotRepositoryError::query("negative slot count"))
    }

    async fn list(&self, filter: &SlotFilter) -> Result<SlotScan, SlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;
        let mut query = slots::table
            .select(SlotRow::as_select())
            .order((slots::start_at.asc(), slots::id.asc()))
            .into_boxed();

        if let Some(owner) = filter.owner_user_id() {
            let owner: &str = owner.as_ref();
            query = query.filter(slots::owner_user_id.eq(owner.to_owned()));
        }
        if let Some(start) = filter.start() {
            query = query.filter(slots::start_at.ge(start));
        }
        if let Some(end) = filter.end() {
            query = query.filter(slots::end_at.le(end));
        }

        let rows = query
            .load_stream::<SlotRow>(&mut conn)
            .await
            .map_err(query_error)?;
        Ok(collect_scan(rows).await)
    }

    async fn insert(&self, slot: NewSlot) -> Result<Slot, SlotRepositoryError> {
        let id = SlotId::random();
        let mut conn = self.pool.get().await.map_err(connection_error)?;
        diesel::insert_into(slots::table)
            .values(&NewSlotRow::new(id, &slot))
            .execute(&mut conn)
            .await
            .map_err(write_error)?;
        Ok(slot.with_id(id))
    }

    async fn delete(&self, id: SlotId) -> Result<bool, SlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;
        let removed = diesel::delete(slots::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(write_error)?;
        Ok(removed > 0)
    }
}
