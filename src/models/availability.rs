use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::scheduling::calendar::{DayOfWeek, TimeOfDay};

/// A recurring weekly window during which a mentor can be booked.
///
/// Blocks are never edited in place; an edit is a delete followed by a create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityBlock {
    pub(crate) fn from_row(row: &tokio_postgres::Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            mentor_id: row.try_get("mentor_id")?,
            day_of_week: DayOfWeek::from_index(row.try_get("day_of_week")?)?,
            start_time: TimeOfDay::from_minutes(row.try_get("start_minute")?)?,
            end_time: TimeOfDay::from_minutes(row.try_get("end_minute")?)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Listing order: Monday first, then by start time.
pub fn sort_by_day(blocks: &mut [AvailabilityBlock]) {
    blocks.sort_by_key(|b| (b.day_of_week, b.start_time));
}
