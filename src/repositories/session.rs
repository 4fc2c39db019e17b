use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::{
    error::{sql_state, AppError, Result},
    models::session::Session,
    repositories::store::SessionStore,
    scheduling::calendar::TimeOfDay,
};

const COLUMNS: &str =
    "id, mentor_id, mentee_id, date, start_minute, end_minute, status, created_at";

/// Postgres-backed sessions.
///
/// The `sessions_no_overlap` exclusion constraint turns a booking race into a
/// deterministic failure for the second writer.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: Pool,
}

impl PgSessionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find_overlapping(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    ) -> Result<Option<Session>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &*format!(
                    "SELECT {COLUMNS} FROM sessions
                     WHERE mentor_id = $1 AND date = $2
                       AND start_minute < $4 AND $3 < end_minute
                     ORDER BY start_minute ASC
                     LIMIT 1"
                ),
                &[&mentor_id, &date, &start_time.as_i16(), &end_time.as_i16()],
            )
            .await?;
        row.as_ref().map(Session::from_row).transpose()
    }

    async fn insert(&self, session: &Session) -> Result<()> {
        let client = self.pool.get().await?;
        let result = client
            .query_opt(
                r#"
                INSERT INTO sessions
                    (id, mentor_id, mentee_id, date, start_minute, end_minute, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT DO NOTHING
                RETURNING id
                "#,
                &[
                    &session.id,
                    &session.mentor_id,
                    &session.mentee_id,
                    &session.date,
                    &session.start_time.as_i16(),
                    &session.end_time.as_i16(),
                    &session.status,
                    &session.created_at,
                ],
            )
            .await;

        match result {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(AppError::Collision),
            Err(e)
                if matches!(
                    sql_state(&e),
                    Some(&SqlState::UNIQUE_VIOLATION) | Some(&SqlState::EXCLUSION_VIOLATION)
                ) =>
            {
                Err(AppError::Collision)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, session_id: Uuid) -> Result<Option<Session>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &*format!("SELECT {COLUMNS} FROM sessions WHERE id = $1"),
                &[&session_id],
            )
            .await?;
        row.as_ref().map(Session::from_row).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Session>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &*format!(
                    "SELECT {COLUMNS} FROM sessions
                     WHERE mentor_id = $1 OR mentee_id = $1
                     ORDER BY date ASC, start_minute ASC"
                ),
                &[&user_id],
            )
            .await?;
        rows.iter().map(Session::from_row).collect()
    }

    async fn count(&self) -> Result<u64> {
        let client = self.pool.get().await?;
        let row = client.query_one("SELECT COUNT(*) AS total FROM sessions", &[]).await?;
        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as u64)
    }
}
