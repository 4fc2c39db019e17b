use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::{
    error::{sql_state, AppError, Result},
    models::availability::AvailabilityBlock,
    repositories::store::AvailabilityStore,
    scheduling::calendar::DayOfWeek,
};

const COLUMNS: &str = "id, mentor_id, day_of_week, start_minute, end_minute, created_at";

/// Postgres-backed availability blocks.
///
/// The `availability_no_overlap` exclusion constraint backs the same-day
/// overlap rule, so two concurrent inserts cannot both land.
#[derive(Clone)]
pub struct PgAvailabilityStore {
    pool: Pool,
}

impl PgAvailabilityStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityStore for PgAvailabilityStore {
    async fn list_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<AvailabilityBlock>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &*format!(
                    "SELECT {COLUMNS} FROM availability_blocks
                     WHERE mentor_id = $1
                     ORDER BY day_of_week ASC, start_minute ASC"
                ),
                &[&mentor_id],
            )
            .await?;
        rows.iter().map(AvailabilityBlock::from_row).collect()
    }

    async fn list_for_mentor_day(
        &self,
        mentor_id: Uuid,
        day: DayOfWeek,
    ) -> Result<Vec<AvailabilityBlock>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &*format!(
                    "SELECT {COLUMNS} FROM availability_blocks
                     WHERE mentor_id = $1 AND day_of_week = $2
                     ORDER BY start_minute ASC"
                ),
                &[&mentor_id, &day.index()],
            )
            .await?;
        rows.iter().map(AvailabilityBlock::from_row).collect()
    }

    async fn insert(&self, block: &AvailabilityBlock) -> Result<()> {
        let client = self.pool.get().await?;
        let result = client
            .execute(
                r#"
                INSERT INTO availability_blocks
                    (id, mentor_id, day_of_week, start_minute, end_minute, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
                &[
                    &block.id,
                    &block.mentor_id,
                    &block.day_of_week.index(),
                    &block.start_time.as_i16(),
                    &block.end_time.as_i16(),
                    &block.created_at,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if sql_state(&e) == Some(&SqlState::EXCLUSION_VIOLATION) => {
                Err(AppError::OverlapDetected)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, block_id: Uuid) -> Result<Option<AvailabilityBlock>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &*format!("SELECT {COLUMNS} FROM availability_blocks WHERE id = $1"),
                &[&block_id],
            )
            .await?;
        row.as_ref().map(AvailabilityBlock::from_row).transpose()
    }

    async fn delete_owned(&self, mentor_id: Uuid, block_id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute(
                "DELETE FROM availability_blocks WHERE id = $1 AND mentor_id = $2",
                &[&block_id, &mentor_id],
            )
            .await?;
        Ok(deleted > 0)
    }
}
