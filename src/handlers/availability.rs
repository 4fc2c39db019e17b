use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    access::{self, Capability},
    error::Result,
    handlers::response,
    models::{auth_session::AuthSession, availability::AvailabilityBlock},
    scheduling::calendar::{DayOfWeek, TimeOfDay},
    services::requests,
    state::AppState,
    validation::payload::Payload,
};

/// The request payload for creating an availability block.
#[derive(Deserialize)]
pub struct CreateBlockRequest {
    pub day_of_week: DayOfWeek,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

#[derive(Deserialize)]
pub struct ListBlocksQuery {
    /// Hide blocks whose occurrence today has already ended.
    #[serde(default)]
    pub upcoming: bool,
}

/// A block together with the date a booking made now would land on.
#[derive(Serialize)]
pub struct BlockView {
    #[serde(flatten)]
    pub block: AvailabilityBlock,
    pub next_date: NaiveDate,
}

#[derive(Serialize)]
struct BlockList {
    blocks: Vec<BlockView>,
    count: usize,
}

fn block_list(state: &AppState, blocks: Vec<AvailabilityBlock>) -> BlockList {
    let blocks: Vec<BlockView> = blocks
        .into_iter()
        .map(|block| BlockView {
            next_date: state.booking.resolve_date(block.day_of_week),
            block,
        })
        .collect();
    BlockList {
        count: blocks.len(),
        blocks,
    }
}

/// Creates a weekly availability block for the calling mentor.
#[axum::debug_handler]
pub async fn create_block(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Payload(req): Payload<CreateBlockRequest>,
) -> Result<Response> {
    let identity = session.identity();
    access::authorize(&identity, Capability::ManageAvailability)?;

    let block = state
        .booking
        .add_availability_block(identity.user_id, req.day_of_week, req.start_time, req.end_time)
        .await?;

    response::json(StatusCode::CREATED, &block)
}

/// Lists the calling mentor's own blocks.
#[axum::debug_handler]
pub async fn list_own_blocks(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(query): Query<ListBlocksQuery>,
) -> Result<Response> {
    let identity = session.identity();
    access::authorize(&identity, Capability::ManageAvailability)?;

    let blocks = state
        .booking
        .list_availability(identity.user_id, query.upcoming)
        .await?;

    response::json(StatusCode::OK, &block_list(&state, blocks))
}

/// Lists a mentor's blocks. Mentees need an accepted request with the mentor.
#[axum::debug_handler]
pub async fn list_mentor_blocks(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(mentor_id): Path<Uuid>,
    Query(query): Query<ListBlocksQuery>,
) -> Result<Response> {
    let identity = session.identity();
    requests::authorize_with_match(
        &state.db,
        &identity,
        Capability::ViewAvailability { mentor_id },
    )
    .await?;

    let blocks = state
        .booking
        .list_availability(mentor_id, query.upcoming)
        .await?;

    response::json(StatusCode::OK, &block_list(&state, blocks))
}

/// Deletes one of the calling mentor's blocks.
#[axum::debug_handler]
pub async fn delete_block(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(block_id): Path<Uuid>,
) -> Result<Response> {
    let identity = session.identity();
    access::authorize(&identity, Capability::ManageAvailability)?;

    state
        .booking
        .delete_availability_block(identity.user_id, block_id)
        .await?;

    response::message(StatusCode::OK, "Availability block deleted")
}
