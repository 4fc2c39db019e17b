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
        request::{RequestStatus, RequestWithCounterpart},
    },
    services::requests as request_service,
    state::AppState,
    validation::payload::{validated, Payload},
};

/// The request payload for asking a mentor for mentorship.
#[derive(Deserialize, Validate)]
pub struct SendRequest {
    #[garde(skip)]
    pub mentor_id: Uuid,
    #[garde(length(max = 1000))]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct RespondRequest {
    pub status: RequestStatus,
}

#[derive(Serialize)]
struct RequestList {
    requests: Vec<RequestWithCounterpart>,
    count: usize,
}

fn request_list(requests: Vec<RequestWithCounterpart>) -> RequestList {
    RequestList {
        count: requests.len(),
        requests,
    }
}

#[axum::debug_handler]
pub async fn send_request(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Payload(req): Payload<SendRequest>,
) -> Result<Response> {
    let req = validated(req)?;
    let request = request_service::send_request(
        &state.db,
        &session.identity(),
        req.mentor_id,
        req.message.as_deref(),
    )
    .await?;

    response::json(StatusCode::CREATED, &request)
}

#[axum::debug_handler]
pub async fn sent_requests(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response> {
    let requests = request_service::list_sent(&state.db, &session.identity()).await?;
    response::json(StatusCode::OK, &request_list(requests))
}

#[axum::debug_handler]
pub async fn received_requests(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Response> {
    let requests = request_service::list_received(&state.db, &session.identity()).await?;
    response::json(StatusCode::OK, &request_list(requests))
}

/// Accepts or rejects a request addressed to the calling mentor.
#[axum::debug_handler]
pub async fn respond_to_request(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(request_id): Path<Uuid>,
    Payload(req): Payload<RespondRequest>,
) -> Result<Response> {
    let request =
        request_service::respond(&state.db, &session.identity(), request_id, req.status).await?;
    response::json(StatusCode::OK, &request)
}
