use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{availability::AvailabilityBlock, session::Session},
    scheduling::calendar::{DayOfWeek, TimeOfDay},
};

/// Persistence for mentors' recurring availability blocks.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// All blocks of one mentor, ordered by day then start time.
    async fn list_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<AvailabilityBlock>>;

    /// Blocks of one mentor on one day.
    async fn list_for_mentor_day(
        &self,
        mentor_id: Uuid,
        day: DayOfWeek,
    ) -> Result<Vec<AvailabilityBlock>>;

    /// Persists a block.
    ///
    /// Fails with `AppError::OverlapDetected` when the store itself detects a
    /// same-day overlap for the mentor.
    async fn insert(&self, block: &AvailabilityBlock) -> Result<()>;

    async fn find(&self, block_id: Uuid) -> Result<Option<AvailabilityBlock>>;

    /// Deletes the block if `mentor_id` owns it. Returns whether a row was removed.
    async fn delete_owned(&self, mentor_id: Uuid, block_id: Uuid) -> Result<bool>;
}

/// Persistence for booked sessions.
///
/// `insert` must be atomic against the mentor's other sessions on the same
/// date: of two concurrent inserts with overlapping ranges, exactly one
/// succeeds and the other fails with `AppError::Collision`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// A session of the mentor on `date` overlapping `[start_time, end_time)`.
    async fn find_overlapping(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    ) -> Result<Option<Session>>;

    async fn insert(&self, session: &Session) -> Result<()>;

    async fn find(&self, session_id: Uuid) -> Result<Option<Session>>;

    /// Sessions where the user is mentor or mentee, by date then start time.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Session>>;

    async fn count(&self) -> Result<u64>;
}
