use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The role a user acts under. Stored as the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "lowercase")]
#[postgres(name = "user_role")]
pub enum Role {
    #[postgres(name = "admin")]
    Admin,
    #[postgres(name = "mentor")]
    Mentor,
    #[postgres(name = "mentee")]
    Mentee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Mentor => "mentor",
            Role::Mentee => "mentee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Represents a user in the system.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's full name.
    pub name: String,
    /// The user's email address, unique across accounts.
    pub email: String,
    /// The user's Argon2 password hash.
    pub password: String,
    /// The role the user acts under.
    pub role: Role,
    /// Free-form biography.
    pub bio: String,
    /// Skills the user offers (mentors) or wants to learn (mentees).
    pub skills: Vec<String>,
    /// Free-form goals.
    pub goals: String,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub skills: Vec<String>,
    pub goals: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            bio: user.bio,
            skills: user.skills,
            goals: user.goals,
            created_at: user.created_at,
        }
    }
}

/// Number of accounts per role, for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleCounts {
    pub admin: i64,
    pub mentor: i64,
    pub mentee: i64,
}
