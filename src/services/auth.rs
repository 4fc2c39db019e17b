use crate::error::{AppError, Result};
use crate::models::user::{Role, User};
use crate::repositories::user as user_repo;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use deadpool_postgres::Pool;
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 2;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn argon2() -> Result<Argon2<'static>> {
    let params = ParamsBuilder::new()
        .m_cost(ARGON2_MEMORY_MB * 1024)
        .t_cost(ARGON2_ITERATIONS)
        .p_cost(ARGON2_PARALLELISM)
        .build()
        .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the PHC-encoded hash.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let hashed = argon2()?
        .hash_password(&password_bytes, &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)));

    password_bytes.zeroize();
    salt_bytes.zeroize();
    hashed
}

/// Verifies a password against a stored hash.
///
/// The parameters are read back from the hash, so older hashes keep verifying
/// after the cost constants change.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let valid = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(valid)
}

/// Creates an account. Only mentors and mentees can sign up; admins are
/// promoted by an existing admin.
///
/// # Arguments
///
/// * `db` - The database connection pool.
/// * `name` - The display name.
/// * `email` - The login email, already normalized.
/// * `password` - The plaintext password.
/// * `role` - The requested role.
///
/// # Returns
///
/// A `Result` containing the created `User`.
pub async fn register_user(
    db: &Pool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User> {
    if role == Role::Admin {
        return Err(AppError::Validation(
            "Role must be mentor or mentee".to_string(),
        ));
    }

    tracing::debug!("🔐 Creating {} account for {}", role, email);
    let hashed_password = hash_password(password)?;
    let user = user_repo::create_user(db, Uuid::new_v4(), name, email, &hashed_password, role).await?;

    tracing::info!("✅ User created with ID: {}", user.id);
    Ok(user)
}

/// Checks an email and password pair.
///
/// Unknown emails and wrong passwords fail with the same message.
pub async fn authenticate_user(db: &Pool, email: &str, password: &str) -> Result<User> {
    tracing::debug!("🔐 Authenticating user: {}", email);

    let user = user_repo::find_by_email(db, email)
        .await?
        .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(password, &user.password)? {
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    tracing::info!("✅ User authenticated: {}", user.id);
    Ok(user)
}
