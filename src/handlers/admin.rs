use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result,
    handlers::response,
    models::{
        auth_session::AuthSession,
        request::Match,
        user::{Role, UserProfile},
    },
    services::admin as admin_service,
    state::AppState,
    validation::payload::Payload,
};

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Serialize)]
struct UserList {
    users: Vec<UserProfile>,
    count: usize,
}

#[derive(Serialize)]
struct MatchList {
    matches: Vec<Match>,
    count: usize,
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response> {
    let users = admin_service::list_users(&state, &session.identity()).await?;
    response::json(
        StatusCode::OK,
        &UserList {
            count: users.len(),
            users,
        },
    )
}

#[axum::debug_handler]
pub async fn change_role(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(user_id): Path<Uuid>,
    Payload(req): Payload<ChangeRoleRequest>,
) -> Result<Response> {
    let user = admin_service::change_role(&state, &session.identity(), user_id, req.role).await?;
    response::json(StatusCode::OK, &user)
}

#[axum::debug_handler]
pub async fn list_matches(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response> {
    let matches = admin_service::list_matches(&state, &session.identity()).await?;
    response::json(
        StatusCode::OK,
        &MatchList {
            count: matches.len(),
            matches,
        },
    )
}

#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response> {
    let stats = admin_service::stats(&state, &session.identity()).await?;
    response::json(StatusCode::OK, &stats)
}
