use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Extension,
};
use chrono::Utc;
use garde::Validate;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    config::Config,
    crypto::csrf,
    error::{AppError, Result},
    handlers::response,
    middleware_layer::{
        auth::{session_key, SESSION_COOKIE},
        csrf::CSRF_COOKIE,
    },
    models::{
        auth_session::AuthSession,
        user::{Role, User, UserProfile},
    },
    services::auth as auth_service,
    state::AppState,
    validation::{auth::*, payload::{validated, Payload}},
};

use redis::AsyncCommands;

/// The request payload for user registration.
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(length(min = 1, max = 100))]
    pub name: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String,
    #[garde(skip)]
    pub role: Role,
}

/// The request payload for user login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(length(min = 1, max = 320))]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// The response payload for register and login.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: UserProfile,
    /// Echo this in the `x-csrf-token` header on mutating requests.
    pub csrf_token: String,
}

fn create_secure_cookie(
    config: &Config,
    name: &'static str,
    value: String,
    max_age_secs: i64,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);

    // The CSRF cookie must stay readable by the frontend.
    if name != CSRF_COOKIE {
        cookie.set_http_only(true);
    }

    if config.production {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie.set_path("/");

    cookie
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_max_age(Duration::seconds(0));
    cookie.set_path("/");
    cookie
}

/// Stores a fresh login session and CSRF token in Redis and sets both cookies.
/// Returns the CSRF token so clients can echo it without reading cookies.
async fn start_session(state: &mut AppState, cookies: &Cookies, user: &User) -> Result<String> {
    let session_id = Uuid::new_v4();
    let duration_secs = state.config.session_duration_days * 86400;

    let session = AuthSession {
        user_id: user.id,
        role: user.role,
        created_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::days(state.config.session_duration_days),
    };
    let session_json = sonic_rs::to_string(&session)
        .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

    let _: () = state
        .redis
        .set_ex(session_key(session_id), &session_json, duration_secs as u64)
        .await?;

    cookies.add(create_secure_cookie(
        &state.config,
        SESSION_COOKIE,
        session_id.to_string(),
        duration_secs,
    ));

    let csrf_token = csrf::generate_csrf_token();
    let _: () = state
        .redis
        .set_ex(csrf::redis_key(&csrf_token), "valid", csrf::CSRF_TOKEN_TTL_SECS)
        .await?;

    cookies.add(create_secure_cookie(
        &state.config,
        CSRF_COOKIE,
        csrf_token.clone(),
        csrf::CSRF_TOKEN_TTL_SECS as i64,
    ));

    tracing::info!("✅ Session {} started for user {}", session_id, user.id);
    Ok(csrf_token)
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(mut state): State<AppState>,
    cookies: Cookies,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<Response> {
    let payload = validated(payload)?;
    validate_name(&payload.name)?;
    validate_password(&payload.password)?;
    let email = normalize_email(&payload.email)?;

    tracing::info!("📝 Register attempt: {} as {}", email, payload.role);

    let user = auth_service::register_user(
        &state.db,
        payload.name.trim(),
        &email,
        &payload.password,
        payload.role,
    )
    .await?;

    let csrf_token = start_session(&mut state, &cookies, &user).await?;

    response::json(
        StatusCode::CREATED,
        &AuthResponse {
            success: true,
            message: "Registration successful. Welcome!",
            user: user.into(),
            csrf_token,
        },
    )
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(mut state): State<AppState>,
    cookies: Cookies,
    Payload(payload): Payload<LoginRequest>,
) -> Result<Response> {
    let payload = validated(payload)?;
    let email = normalize_email(&payload.email)?;

    let user = auth_service::authenticate_user(&state.db, &email, &payload.password).await?;
    let csrf_token = start_session(&mut state, &cookies, &user).await?;

    tracing::info!("✅ User logged in: {}", user.id);

    response::json(
        StatusCode::OK,
        &AuthResponse {
            success: true,
            message: "Login successful",
            user: user.into(),
            csrf_token,
        },
    )
}

/// Handles user logout.
#[axum::debug_handler]
pub async fn logout(
    State(mut state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    cookies: Cookies,
) -> Result<Response> {
    let session_id = cookies
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
        .ok_or(AppError::Unauthorized)?;

    let _: () = state.redis.del(session_key(session_id)).await?;

    if let Some(csrf_cookie) = cookies.get(CSRF_COOKIE) {
        let _: () = state
            .redis
            .del(csrf::redis_key(csrf_cookie.value()))
            .await
            .unwrap_or(());
    }

    cookies.remove(expired_cookie(SESSION_COOKIE));
    cookies.remove(expired_cookie(CSRF_COOKIE));

    tracing::info!("👋 User logged out: {}", session.user_id);

    response::message(StatusCode::OK, "Logout successful")
}
