use chrono::{DateTime, NaiveDate, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::scheduling::calendar::TimeOfDay;

/// Lifecycle of a booked session. New sessions start as `Upcoming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "UPPERCASE")]
#[postgres(name = "session_status")]
pub enum SessionStatus {
    #[default]
    #[postgres(name = "UPCOMING")]
    Upcoming,
    #[postgres(name = "COMPLETED")]
    Completed,
    #[postgres(name = "CANCELLED")]
    Cancelled,
}

/// A concrete, dated meeting between one mentor and one mentee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn from_row(row: &tokio_postgres::Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            mentor_id: row.try_get("mentor_id")?,
            mentee_id: row.try_get("mentee_id")?,
            date: row.try_get("date")?,
            start_time: TimeOfDay::from_minutes(row.try_get("start_minute")?)?,
            end_time: TimeOfDay::from_minutes(row.try_get("end_minute")?)?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.mentor_id == user_id || self.mentee_id == user_id
    }
}

/// A session as shown to one of its participants.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub mentor_name: Option<String>,
    pub mentee_name: Option<String>,
    /// Whether the viewing user already left feedback for this session.
    pub has_feedback: bool,
}
