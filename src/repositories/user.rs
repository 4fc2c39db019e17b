use deadpool_postgres::Pool;
use tokio_postgres::{error::SqlState, Row};
use uuid::Uuid;
use crate::{
    error::{sql_state, AppError, Result},
    models::user::{Role, RoleCounts, User},
};

const COLUMNS: &str =
    "id, name, email, password, role, bio, skills, goals, created_at, updated_at";

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        role: row.try_get("role")?,
        bio: row.try_get("bio")?,
        skills: row.try_get("skills")?,
        goals: row.try_get("goals")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Creates a new user in the database.
///
/// Fails with `AppError::Conflict` when the email is already registered.
pub async fn create_user(
    pool: &Pool,
    id: Uuid,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    let client = pool.get().await?;
    let result = client
        .query_one(
            &*format!(
                "INSERT INTO users (id, name, email, password, role)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {COLUMNS}"
            ),
            &[&id, &name, &email, &password_hash, &role],
        )
        .await;

    match result {
        Ok(row) => row_to_user(&row),
        Err(e) if sql_state(&e) == Some(&SqlState::UNIQUE_VIOLATION) => {
            Err(AppError::Conflict("User already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Finds a user by their email address.
pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &*format!("SELECT {COLUMNS} FROM users WHERE email = $1"),
            &[&email],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds a user by their ID.
pub async fn find_by_id(pool: &Pool, user_id: &Uuid) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &*format!("SELECT {COLUMNS} FROM users WHERE id = $1"),
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Returns `(id, name)` pairs for the given users.
pub async fn find_names(pool: &Pool, user_ids: &[Uuid]) -> Result<Vec<(Uuid, String)>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let client = pool.get().await?;
    let rows = client
        .query("SELECT id, name FROM users WHERE id = ANY($1)", &[&user_ids])
        .await?;
    rows.iter()
        .map(|row| -> Result<(Uuid, String)> { Ok((row.try_get("id")?, row.try_get("name")?)) })
        .collect()
}

/// Updates the editable profile fields. `None` keeps the stored value.
pub async fn update_profile(
    pool: &Pool,
    user_id: &Uuid,
    bio: Option<&str>,
    skills: Option<&[String]>,
    goals: Option<&str>,
) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &*format!(
                "UPDATE users
                 SET bio = COALESCE($2, bio),
                     skills = COALESCE($3, skills),
                     goals = COALESCE($4, goals),
                     updated_at = NOW()
                 WHERE id = $1
                 RETURNING {COLUMNS}"
            ),
            &[user_id, &bio, &skills, &goals],
        )
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    row_to_user(&row)
}

/// Lists mentors, optionally keeping only those with a skill matching `skill`
/// case-insensitively.
pub async fn list_mentors(pool: &Pool, skill: Option<&str>) -> Result<Vec<User>> {
    let client = pool.get().await?;
    let pattern = skill.map(|s| format!("%{}%", escape_like(s)));
    let rows = client
        .query(
            &*format!(
                "SELECT {COLUMNS} FROM users
                 WHERE role = 'mentor'
                   AND ($1::TEXT IS NULL
                        OR EXISTS (SELECT 1 FROM unnest(skills) AS s WHERE s ILIKE $1))
                 ORDER BY name ASC"
            ),
            &[&pattern],
        )
        .await?;
    rows.iter().map(row_to_user).collect()
}

/// Lists every user, newest first.
pub async fn list_all(pool: &Pool) -> Result<Vec<User>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &*format!("SELECT {COLUMNS} FROM users ORDER BY created_at DESC"),
            &[],
        )
        .await?;
    rows.iter().map(row_to_user).collect()
}

/// Changes a user's role.
pub async fn update_role(pool: &Pool, user_id: &Uuid, role: Role) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &*format!(
                "UPDATE users SET role = $2, updated_at = NOW()
                 WHERE id = $1
                 RETURNING {COLUMNS}"
            ),
            &[user_id, &role],
        )
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    row_to_user(&row)
}

/// Counts accounts per role.
pub async fn count_by_role(pool: &Pool) -> Result<RoleCounts> {
    let client = pool.get().await?;
    let rows = client
        .query("SELECT role, COUNT(*) AS total FROM users GROUP BY role", &[])
        .await?;

    let mut counts = RoleCounts::default();
    for row in rows {
        let total: i64 = row.try_get("total")?;
        match row.try_get::<_, Role>("role")? {
            Role::Admin => counts.admin = total,
            Role::Mentor => counts.mentor = total,
            Role::Mentee => counts.mentee = total,
        }
    }
    Ok(counts)
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
