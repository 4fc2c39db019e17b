use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "UPPERCASE")]
#[postgres(name = "request_status")]
pub enum RequestStatus {
    #[postgres(name = "PENDING")]
    Pending,
    #[postgres(name = "ACCEPTED")]
    Accepted,
    #[postgres(name = "REJECTED")]
    Rejected,
}

/// A mentee's request to be mentored by a mentor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorshipRequest {
    pub id: Uuid,
    /// The mentee who sent the request.
    pub from_id: Uuid,
    /// The mentor the request is addressed to.
    pub to_id: Uuid,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for MentorshipRequest {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            from_id: row.get("from_id"),
            to_id: row.get("to_id"),
            message: row.get("message"),
            status: row.get("status"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// A request joined with the name of the user on the other side.
#[derive(Debug, Clone, Serialize)]
pub struct RequestWithCounterpart {
    #[serde(flatten)]
    pub request: MentorshipRequest,
    pub counterpart_name: String,
    pub counterpart_email: String,
}

impl RequestWithCounterpart {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            request: MentorshipRequest::from(row),
            counterpart_name: row.try_get("counterpart_name")?,
            counterpart_email: row.try_get("counterpart_email")?,
        })
    }
}

/// An accepted mentor/mentee pairing, for admins.
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub request_id: Uuid,
    pub mentee_id: Uuid,
    pub mentee_name: String,
    pub mentee_email: String,
    pub mentor_id: Uuid,
    pub mentor_name: String,
    pub mentor_email: String,
    pub accepted_at: DateTime<Utc>,
}
