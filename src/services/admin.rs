use serde::Serialize;
use uuid::Uuid;

use crate::{
    access::{self, Capability},
    error::{AppError, Result},
    models::{
        auth_session::Identity,
        request::Match,
        user::{Role, RoleCounts, UserProfile},
    },
    repositories::{request as request_repo, user as user_repo},
    state::AppState,
};

/// Dashboard counters.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub users: RoleCounts,
    pub total_sessions: u64,
}

pub async fn list_users(state: &AppState, identity: &Identity) -> Result<Vec<UserProfile>> {
    access::authorize(identity, Capability::Administer)?;
    let users = user_repo::list_all(&state.db).await?;
    Ok(users.into_iter().map(UserProfile::from).collect())
}

/// Changes another user's role.
///
/// Admins cannot change their own role, so the last admin cannot lock
/// everyone out. Existing login sessions keep the role they were issued with
/// until they expire.
pub async fn change_role(
    state: &AppState,
    identity: &Identity,
    user_id: Uuid,
    role: Role,
) -> Result<UserProfile> {
    access::authorize(identity, Capability::Administer)?;

    if user_id == identity.user_id {
        return Err(AppError::Validation(
            "Admins cannot change their own role".to_string(),
        ));
    }

    let user = user_repo::update_role(&state.db, &user_id, role).await?;
    tracing::info!("🛡️ Admin {} set role of {} to {}", identity.user_id, user.id, role);
    Ok(user.into())
}

pub async fn list_matches(state: &AppState, identity: &Identity) -> Result<Vec<Match>> {
    access::authorize(identity, Capability::Administer)?;
    request_repo::list_matches(&state.db).await
}

pub async fn stats(state: &AppState, identity: &Identity) -> Result<Stats> {
    access::authorize(identity, Capability::Administer)?;
    Ok(Stats {
        users: user_repo::count_by_role(&state.db).await?,
        total_sessions: state.booking.count_sessions().await?,
    })
}
