use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use uuid::Uuid;
use crate::{
    error::{sql_state, AppError, Result},
    models::request::{Match, MentorshipRequest, RequestStatus, RequestWithCounterpart},
};

const COLUMNS: &str = "id, from_id, to_id, message, status, created_at, updated_at";

/// Creates a pending request from a mentee to a mentor.
///
/// Fails with `AppError::Conflict` when the pair already has an open
/// (pending or accepted) request.
pub async fn create_request(
    pool: &Pool,
    id: Uuid,
    from_id: Uuid,
    to_id: Uuid,
    message: Option<&str>,
) -> Result<MentorshipRequest> {
    let client = pool.get().await?;
    let result = client
        .query_one(
            &*format!(
                "INSERT INTO mentorship_requests (id, from_id, to_id, message)
                 VALUES ($1, $2, $3, $4)
                 RETURNING {COLUMNS}"
            ),
            &[&id, &from_id, &to_id, &message],
        )
        .await;

    match result {
        Ok(row) => Ok(MentorshipRequest::from(&row)),
        Err(e) if sql_state(&e) == Some(&SqlState::UNIQUE_VIOLATION) => {
            Err(open_request_conflict())
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn open_request_conflict() -> AppError {
    AppError::Conflict("A request to this mentor is already open".to_string())
}

/// Whether an open (pending or accepted) request already links the pair.
pub async fn has_open_request(pool: &Pool, from_id: Uuid, to_id: Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT EXISTS (
                 SELECT 1 FROM mentorship_requests
                 WHERE from_id = $1 AND to_id = $2 AND status IN ('PENDING', 'ACCEPTED')
             ) AS open",
            &[&from_id, &to_id],
        )
        .await?;
    Ok(row.try_get("open")?)
}

/// Whether the mentee has an accepted request with the mentor.
pub async fn is_accepted(pool: &Pool, mentee_id: Uuid, mentor_id: Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT EXISTS (
                 SELECT 1 FROM mentorship_requests
                 WHERE from_id = $1 AND to_id = $2 AND status = 'ACCEPTED'
             ) AS accepted",
            &[&mentee_id, &mentor_id],
        )
        .await?;
    Ok(row.try_get("accepted")?)
}

/// Requests sent by a mentee, newest first, with the mentor's name.
pub async fn list_sent(pool: &Pool, mentee_id: Uuid) -> Result<Vec<RequestWithCounterpart>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT r.id, r.from_id, r.to_id, r.message, r.status, r.created_at, r.updated_at,
                    u.name AS counterpart_name, u.email AS counterpart_email
             FROM mentorship_requests r
             JOIN users u ON u.id = r.to_id
             WHERE r.from_id = $1
             ORDER BY r.created_at DESC",
            &[&mentee_id],
        )
        .await?;
    rows.iter().map(RequestWithCounterpart::from_row).collect()
}

/// Requests received by a mentor, newest first, with the mentee's name.
pub async fn list_received(pool: &Pool, mentor_id: Uuid) -> Result<Vec<RequestWithCounterpart>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT r.id, r.from_id, r.to_id, r.message, r.status, r.created_at, r.updated_at,
                    u.name AS counterpart_name, u.email AS counterpart_email
             FROM mentorship_requests r
             JOIN users u ON u.id = r.from_id
             WHERE r.to_id = $1
             ORDER BY r.created_at DESC",
            &[&mentor_id],
        )
        .await?;
    rows.iter().map(RequestWithCounterpart::from_row).collect()
}

/// Sets the status of a request addressed to `mentor_id`.
///
/// Reopening an old request while the pair has another open one fails with
/// `AppError::Conflict`.
pub async fn update_status(
    pool: &Pool,
    request_id: Uuid,
    mentor_id: Uuid,
    status: RequestStatus,
) -> Result<MentorshipRequest> {
    let client = pool.get().await?;
    let result = client
        .query_opt(
            &*format!(
                "UPDATE mentorship_requests
                 SET status = $3, updated_at = NOW()
                 WHERE id = $1 AND to_id = $2
                 RETURNING {COLUMNS}"
            ),
            &[&request_id, &mentor_id, &status],
        )
        .await;

    match result {
        Ok(Some(row)) => Ok(MentorshipRequest::from(&row)),
        Ok(None) => Err(AppError::not_found("Request")),
        Err(e) if sql_state(&e) == Some(&SqlState::UNIQUE_VIOLATION) => {
            Err(open_request_conflict())
        }
        Err(e) => Err(e.into()),
    }
}

/// All accepted pairings with both participants' names.
pub async fn list_matches(pool: &Pool) -> Result<Vec<Match>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT r.id AS request_id, r.updated_at AS accepted_at,
                    mentee.id AS mentee_id, mentee.name AS mentee_name, mentee.email AS mentee_email,
                    mentor.id AS mentor_id, mentor.name AS mentor_name, mentor.email AS mentor_email
             FROM mentorship_requests r
             JOIN users mentee ON mentee.id = r.from_id
             JOIN users mentor ON mentor.id = r.to_id
             WHERE r.status = 'ACCEPTED'
             ORDER BY r.updated_at DESC",
            &[],
        )
        .await?;

    rows.iter()
        .map(|row| -> Result<Match> {
            Ok(Match {
                request_id: row.try_get("request_id")?,
                mentee_id: row.try_get("mentee_id")?,
                mentee_name: row.try_get("mentee_name")?,
                mentee_email: row.try_get("mentee_email")?,
                mentor_id: row.try_get("mentor_id")?,
                mentor_name: row.try_get("mentor_name")?,
                mentor_email: row.try_get("mentor_email")?,
                accepted_at: row.try_get("accepted_at")?,
            })
        })
        .collect()
}
