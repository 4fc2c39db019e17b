use deadpool_postgres::Pool;
use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::{feedback::Feedback, user::Role},
};

/// Stores feedback unless this author already left feedback for the session.
pub async fn create_feedback(
    pool: &Pool,
    id: Uuid,
    session_id: Uuid,
    author_id: Uuid,
    author_role: Role,
    rating: i16,
    comment: &str,
) -> Result<Feedback> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            INSERT INTO feedback (id, session_id, author_id, author_role, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (session_id, author_role, author_id) DO NOTHING
            RETURNING id, session_id, author_id, author_role, rating, comment, created_at
            "#,
            &[&id, &session_id, &author_id, &author_role, &rating, &comment],
        )
        .await?
        .ok_or_else(|| {
            AppError::Conflict("Feedback already submitted for this session".to_string())
        })?;
    Ok(Feedback::from(&row))
}

/// Of the given sessions, those the author has already reviewed.
pub async fn reviewed_sessions(
    pool: &Pool,
    author_id: Uuid,
    session_ids: &[Uuid],
) -> Result<Vec<Uuid>> {
    if session_ids.is_empty() {
        return Ok(Vec::new());
    }
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT session_id FROM feedback WHERE author_id = $1 AND session_id = ANY($2)",
            &[&author_id, &session_ids],
        )
        .await?;
    rows.iter()
        .map(|row| -> Result<Uuid> { Ok(row.try_get("session_id")?) })
        .collect()
}

/// Feedback left on one session, oldest first.
pub async fn list_for_session(pool: &Pool, session_id: Uuid) -> Result<Vec<Feedback>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT id, session_id, author_id, author_role, rating, comment, created_at
             FROM feedback WHERE session_id = $1 ORDER BY created_at ASC",
            &[&session_id],
        )
        .await?;
    Ok(rows.iter().map(Feedback::from).collect())
}
