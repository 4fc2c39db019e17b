use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{
    access::{self, Capability},
    error::{AppError, Result},
    models::{
        auth_session::Identity,
        feedback::Feedback,
        session::{Session, SessionView},
        user::Role,
    },
    repositories::{feedback as feedback_repo, user as user_repo},
    scheduling::calendar::{DayOfWeek, TimeOfDay},
    services::requests,
    state::AppState,
};

/// Books a slot for the calling mentee. The mentee needs an accepted request
/// with the mentor first.
pub async fn book(
    state: &AppState,
    identity: &Identity,
    mentor_id: Uuid,
    day_of_week: DayOfWeek,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
) -> Result<Session> {
    access::authorize(identity, Capability::BookSession)?;
    requests::ensure_accepted(&state.db, identity.user_id, mentor_id).await?;

    state
        .booking
        .book_session(mentor_id, identity.user_id, day_of_week, start_time, end_time)
        .await
}

/// The caller's sessions with both participants' names and whether the caller
/// already reviewed each one.
pub async fn list_mine(state: &AppState, identity: &Identity) -> Result<Vec<SessionView>> {
    access::authorize(identity, Capability::ViewSessions)?;

    let sessions = state.booking.list_sessions(identity.user_id).await?;
    if sessions.is_empty() {
        return Ok(Vec::new());
    }

    let mut people: Vec<Uuid> = sessions
        .iter()
        .flat_map(|s| [s.mentor_id, s.mentee_id])
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    people.sort();
    let names: HashMap<Uuid, String> = user_repo::find_names(&state.db, &people)
        .await?
        .into_iter()
        .collect();

    let ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();
    let reviewed: HashSet<Uuid> = feedback_repo::reviewed_sessions(&state.db, identity.user_id, &ids)
        .await?
        .into_iter()
        .collect();

    Ok(sessions
        .into_iter()
        .map(|session| SessionView {
            mentor_name: names.get(&session.mentor_id).cloned(),
            mentee_name: names.get(&session.mentee_id).cloned(),
            has_feedback: reviewed.contains(&session.id),
            session,
        })
        .collect())
}

/// Leaves feedback on a session the caller took part in.
///
/// The author's side is taken from the session, not from the caller's role.
pub async fn submit_feedback(
    state: &AppState,
    identity: &Identity,
    session_id: Uuid,
    rating: i16,
    comment: &str,
) -> Result<Feedback> {
    access::authorize(identity, Capability::SubmitFeedback)?;

    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let session = state.booking.get_session(identity, session_id).await?;
    let author_role = if session.mentor_id == identity.user_id {
        Role::Mentor
    } else if session.mentee_id == identity.user_id {
        Role::Mentee
    } else {
        return Err(AppError::not_found("Session"));
    };

    let feedback = feedback_repo::create_feedback(
        &state.db,
        Uuid::new_v4(),
        session.id,
        identity.user_id,
        author_role,
        rating,
        comment.trim(),
    )
    .await?;

    tracing::info!(
        "⭐ Feedback {} ({}/5) left by {} {} on session {}",
        feedback.id,
        rating,
        author_role,
        identity.user_id,
        session.id
    );
    Ok(feedback)
}

/// A session with the feedback left on it, for its participants and admins.
pub async fn detail(
    state: &AppState,
    identity: &Identity,
    session_id: Uuid,
) -> Result<(Session, Vec<Feedback>)> {
    access::authorize(identity, Capability::ViewSessions)?;
    let session = state.booking.get_session(identity, session_id).await?;
    let feedback = feedback_repo::list_for_session(&state.db, session.id).await?;
    Ok((session, feedback))
}
