use axum::{
    extract::{Path, Query, State},
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
    models::{auth_session::AuthSession, user::UserProfile},
    services::users::{self as user_service, ProfileUpdate},
    state::AppState,
    validation::payload::{validated, Payload},
};

/// The request payload for updating one's own profile.
#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[garde(length(max = 2000))]
    pub bio: Option<String>,
    #[garde(length(max = 30))]
    pub skills: Option<Vec<String>>,
    #[garde(length(max = 2000))]
    pub goals: Option<String>,
}

#[derive(Deserialize)]
pub struct MentorQuery {
    pub skill: Option<String>,
}

#[derive(Serialize)]
struct MentorList {
    mentors: Vec<UserProfile>,
    count: usize,
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response> {
    let profile = user_service::get_profile(&state.db, session.user_id).await?;
    response::json(StatusCode::OK, &profile)
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Payload(req): Payload<UpdateProfileRequest>,
) -> Result<Response> {
    let req = validated(req)?;
    let profile = user_service::update_profile(
        &state.db,
        &session.identity(),
        ProfileUpdate {
            bio: req.bio,
            skills: req.skills,
            goals: req.goals,
        },
    )
    .await?;
    response::json(StatusCode::OK, &profile)
}

/// Lists mentors, filtered by `?skill=` when given.
#[axum::debug_handler]
pub async fn list_mentors(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(query): Query<MentorQuery>,
) -> Result<Response> {
    let mentors =
        user_service::list_mentors(&state.db, &session.identity(), query.skill.as_deref()).await?;
    response::json(
        StatusCode::OK,
        &MentorList {
            count: mentors.len(),
            mentors,
        },
    )
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(_session): Extension<AuthSession>,
    Path(user_id): Path<Uuid>,
) -> Result<Response> {
    let profile = user_service::get_profile(&state.db, user_id).await?;
    response::json(StatusCode::OK, &profile)
}
