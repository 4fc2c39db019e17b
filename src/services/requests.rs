use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    access::{self, Capability, Decision},
    error::{AppError, Result},
    models::{
        auth_session::Identity,
        request::{MentorshipRequest, RequestStatus, RequestWithCounterpart},
        user::Role,
    },
    repositories::{request as request_repo, user as user_repo},
};

/// Sends a mentorship request from the calling mentee to `mentor_id`.
///
/// # Arguments
///
/// * `db` - The database connection pool.
/// * `identity` - The caller.
/// * `mentor_id` - The mentor being asked.
/// * `message` - An optional note for the mentor.
///
/// # Returns
///
/// A `Result` containing the pending request.
pub async fn send_request(
    db: &Pool,
    identity: &Identity,
    mentor_id: Uuid,
    message: Option<&str>,
) -> Result<MentorshipRequest> {
    access::authorize(identity, Capability::SendRequest)?;

    let mentor = user_repo::find_by_id(db, &mentor_id)
        .await?
        .filter(|user| user.role == Role::Mentor)
        .ok_or_else(|| AppError::not_found("Mentor"))?;

    if request_repo::has_open_request(db, identity.user_id, mentor.id).await? {
        return Err(request_repo::open_request_conflict());
    }

    let message = message.map(str::trim).filter(|m| !m.is_empty());
    let request =
        request_repo::create_request(db, Uuid::new_v4(), identity.user_id, mentor.id, message)
            .await?;

    tracing::info!(
        "📨 Request {} sent from {} to mentor {}",
        request.id,
        identity.user_id,
        mentor.id
    );
    Ok(request)
}

pub async fn list_sent(db: &Pool, identity: &Identity) -> Result<Vec<RequestWithCounterpart>> {
    access::authorize(identity, Capability::SendRequest)?;
    request_repo::list_sent(db, identity.user_id).await
}

pub async fn list_received(db: &Pool, identity: &Identity) -> Result<Vec<RequestWithCounterpart>> {
    access::authorize(identity, Capability::ReviewRequests)?;
    request_repo::list_received(db, identity.user_id).await
}

/// Accepts or rejects a request addressed to the calling mentor.
pub async fn respond(
    db: &Pool,
    identity: &Identity,
    request_id: Uuid,
    status: RequestStatus,
) -> Result<MentorshipRequest> {
    access::authorize(identity, Capability::ReviewRequests)?;

    if status == RequestStatus::Pending {
        return Err(AppError::Validation(
            "Status must be ACCEPTED or REJECTED".to_string(),
        ));
    }

    let request = request_repo::update_status(db, request_id, identity.user_id, status).await?;
    tracing::info!(
        "✅ Request {} marked {:?} by mentor {}",
        request.id,
        status,
        identity.user_id
    );
    Ok(request)
}

/// Fails with `AppError::Unauthorized` unless the mentee has an accepted
/// request with the mentor.
pub async fn ensure_accepted(db: &Pool, mentee_id: Uuid, mentor_id: Uuid) -> Result<()> {
    if request_repo::is_accepted(db, mentee_id, mentor_id).await? {
        Ok(())
    } else {
        tracing::warn!(
            "⛔ Mentee {} has no accepted request with mentor {}",
            mentee_id,
            mentor_id
        );
        Err(AppError::Unauthorized)
    }
}

/// Resolves a capability that may hinge on an accepted request.
pub async fn authorize_with_match(
    db: &Pool,
    identity: &Identity,
    capability: Capability,
) -> Result<()> {
    match access::decide(identity, capability) {
        Decision::Allow => Ok(()),
        Decision::AllowIfAccepted { mentor_id } => {
            ensure_accepted(db, identity.user_id, mentor_id).await
        }
        Decision::Deny => access::authorize(identity, capability),
    }
}
