use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    access::{self, Capability},
    error::{AppError, Result},
    models::{auth_session::Identity, user::UserProfile},
    repositories::user as user_repo,
};

/// Profile fields a user may change about themselves. `None` leaves a field as is.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub goals: Option<String>,
}

pub async fn get_profile(db: &Pool, user_id: Uuid) -> Result<UserProfile> {
    user_repo::find_by_id(db, &user_id)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::not_found("User"))
}

/// Updates the caller's own profile.
pub async fn update_profile(
    db: &Pool,
    identity: &Identity,
    update: ProfileUpdate,
) -> Result<UserProfile> {
    let skills = update.skills.map(normalize_skills).transpose()?;
    let user = user_repo::update_profile(
        db,
        &identity.user_id,
        update.bio.as_deref().map(str::trim),
        skills.as_deref(),
        update.goals.as_deref().map(str::trim),
    )
    .await?;

    tracing::info!("✅ Profile updated for user: {}", user.id);
    Ok(user.into())
}

/// Mentors, optionally filtered by a case-insensitive skill fragment.
pub async fn list_mentors(
    db: &Pool,
    identity: &Identity,
    skill: Option<&str>,
) -> Result<Vec<UserProfile>> {
    access::authorize(identity, Capability::BrowseMentors)?;
    let skill = skill.map(str::trim).filter(|s| !s.is_empty());
    let mentors = user_repo::list_mentors(db, skill).await?;
    Ok(mentors.into_iter().map(UserProfile::from).collect())
}

const MAX_SKILL_LEN: usize = 50;

/// Trims skills, drops blanks and repeats (case-insensitively), keeping order.
fn normalize_skills(skills: Vec<String>) -> Result<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let mut kept = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim();
        if skill.chars().count() > MAX_SKILL_LEN {
            return Err(AppError::Validation(format!(
                "Skills must be at most {} characters",
                MAX_SKILL_LEN
            )));
        }
        if !skill.is_empty() && seen.insert(skill.to_lowercase()) {
            kept.push(skill.to_string());
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::normalize_skills;

    #[test]
    fn skills_are_trimmed_and_deduplicated() {
        let skills = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "SQL".to_string(),
        ];
        assert_eq!(
            normalize_skills(skills).unwrap(),
            vec!["Rust".to_string(), "SQL".to_string()]
        );
    }

    #[test]
    fn overlong_skill_is_rejected() {
        assert!(normalize_skills(vec!["x".repeat(51)]).is_err());
    }
}
