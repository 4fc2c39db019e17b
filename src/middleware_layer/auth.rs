use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{models::auth_session::AuthSession, state::AppState};

use redis::AsyncCommands;

/// Name of the HttpOnly cookie carrying the login session id.
pub const SESSION_COOKIE: &str = "session_id";

pub fn session_key(session_id: Uuid) -> String {
    format!("session:{}", session_id)
}

fn extract_session_token(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// A middleware that requires a valid login session.
///
/// On success the `AuthSession` is inserted into the request extensions, and
/// handlers take the caller's identity from it.
pub async fn require_auth(
    State(mut state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = extract_session_token(&cookies).ok_or_else(|| {
        tracing::debug!("❌ No session_id cookie found");
        StatusCode::UNAUTHORIZED
    })?;

    let session_json: Option<String> = state
        .redis
        .get(session_key(session_id))
        .await
        .map_err(|e| {
            tracing::error!("❌ Redis error while loading session: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let session_json = session_json.ok_or_else(|| {
        tracing::debug!("❌ Unknown session: {}", session_id);
        StatusCode::UNAUTHORIZED
    })?;

    let session: AuthSession = sonic_rs::from_str(&session_json).map_err(|e| {
        tracing::warn!("❌ Invalid session JSON: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    if chrono::Utc::now() > session.expires_at {
        tracing::info!("⌛ Session expired for user: {}", session.user_id);
        let _: () = state
            .redis
            .del(session_key(session_id))
            .await
            .unwrap_or(());
        return Err(StatusCode::UNAUTHORIZED);
    }

    tracing::debug!("✅ User authenticated: {} ({})", session.user_id, session.role);

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
