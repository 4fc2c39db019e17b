use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result,
    handlers::response,
    models::{
        auth_session::AuthSession,
        feedback::Feedback,
        session::{Session, SessionView},
    },
    scheduling::calendar::{DayOfWeek, TimeOfDay},
    services::sessions as session_service,
    state::AppState,
    validation::payload::{validated, Payload},
};

/// The request payload for booking a session.
#[derive(Deserialize)]
pub struct BookSessionRequest {
    pub mentor_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

/// The request payload for leaving feedback.
#[derive(Deserialize, Validate)]
pub struct FeedbackRequest {
    #[garde(range(min = 1, max = 5))]
    pub rating: i16,
    #[garde(length(max = 2000))]
    #[serde(default)]
    pub comment: String,
}

#[derive(Serialize)]
struct SessionList {
    sessions: Vec<SessionView>,
    count: usize,
}

#[derive(Serialize)]
struct SessionDetail {
    session: Session,
    feedback: Vec<Feedback>,
}

/// Books the next occurrence of a mentor's slot for the calling mentee.
#[axum::debug_handler]
pub async fn book_session(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Payload(req): Payload<BookSessionRequest>,
) -> Result<Response> {
    let booked = session_service::book(
        &state,
        &session.identity(),
        req.mentor_id,
        req.day_of_week,
        req.start_time,
        req.end_time,
    )
    .await?;

    response::json(StatusCode::CREATED, &booked)
}

/// Lists the caller's sessions.
#[axum::debug_handler]
pub async fn my_sessions(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response> {
    let sessions = session_service::list_mine(&state, &session.identity()).await?;
    response::json(
        StatusCode::OK,
        &SessionList {
            count: sessions.len(),
            sessions,
        },
    )
}

/// Shows one session with its feedback.
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(session_id): Path<Uuid>,
) -> Result<Response> {
    let (found, feedback) = session_service::detail(&state, &session.identity(), session_id).await?;
    response::json(
        StatusCode::OK,
        &SessionDetail {
            session: found,
            feedback,
        },
    )
}

/// Leaves feedback on a session the caller took part in.
#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(session_id): Path<Uuid>,
    Payload(req): Payload<FeedbackRequest>,
) -> Result<Response> {
    let req = validated(req)?;
    let feedback = session_service::submit_feedback(
        &state,
        &session.identity(),
        session_id,
        req.rating,
        &req.comment,
    )
    .await?;

    response::json(StatusCode::CREATED, &feedback)
}
