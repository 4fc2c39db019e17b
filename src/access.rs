//! Role-based authorization. Every role check in the handlers goes through
//! [`authorize`].

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{auth_session::Identity, user::Role};

/// Something a caller may try to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, list and delete one's own availability blocks.
    ManageAvailability,
    /// See another user's availability blocks.
    ViewAvailability { mentor_id: Uuid },
    /// Book a session against a mentor's availability.
    BookSession,
    /// Send a mentorship request.
    SendRequest,
    /// Accept or reject received mentorship requests.
    ReviewRequests,
    /// Browse the mentor directory.
    BrowseMentors,
    /// List or open one's own sessions.
    ViewSessions,
    /// Leave feedback on a session one took part in.
    SubmitFeedback,
    /// Admin-only views and role changes.
    Administer,
}

/// The outcome of a role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Allowed once an accepted mentorship request links the mentee to the mentor.
    AllowIfAccepted { mentor_id: Uuid },
    Deny,
}

pub fn decide(identity: &Identity, capability: Capability) -> Decision {
    use Capability::*;

    match (identity.role, capability) {
        (
            Role::Admin,
            ManageAvailability | BookSession | SendRequest | ReviewRequests | SubmitFeedback,
        ) => {
            Decision::Deny
        }
        (Role::Admin, _) => Decision::Allow,

        (Role::Mentor, ManageAvailability | ReviewRequests | ViewSessions | SubmitFeedback) => {
            Decision::Allow
        }
        (Role::Mentor, ViewAvailability { mentor_id }) if mentor_id == identity.user_id => {
            Decision::Allow
        }
        (Role::Mentor, _) => Decision::Deny,

        (Role::Mentee, SendRequest | BrowseMentors | ViewSessions | SubmitFeedback | BookSession) => {
            Decision::Allow
        }
        (Role::Mentee, ViewAvailability { mentor_id }) => Decision::AllowIfAccepted { mentor_id },
        (Role::Mentee, _) => Decision::Deny,
    }
}

/// Fails with `AppError::Unauthorized` unless the role outright allows the
/// capability. Callers that can satisfy [`Decision::AllowIfAccepted`] use
/// [`decide`] instead.
pub fn authorize(identity: &Identity, capability: Capability) -> Result<()> {
    match decide(identity, capability) {
        Decision::Allow => Ok(()),
        Decision::AllowIfAccepted { .. } | Decision::Deny => {
            tracing::warn!(
                "⛔ {} {} denied {:?}",
                identity.role,
                identity.user_id,
                capability
            );
            Err(AppError::Unauthorized)
        }
    }
}
