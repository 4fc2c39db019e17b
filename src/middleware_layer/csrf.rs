use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;
use tower_cookies::Cookies;

use crate::{
    crypto::csrf::{self, tokens_match},
    error::AppError,
    state::AppState,
};

/// Name of the script-readable cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "csrf_token";
/// Header mutating requests must echo the token in.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// A middleware that verifies the CSRF token on mutating requests.
///
/// The header must match the cookie and the token must still be known to Redis.
pub async fn verify_csrf(
    State(mut state): State<AppState>,
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(req).await;
    }

    let Some(cookie_token) = cookies.get(CSRF_COOKIE).map(|c| c.value().to_string()) else {
        tracing::warn!("❌ CSRF: missing csrf_token cookie");
        return AppError::Authentication("Missing CSRF token cookie".to_string()).into_response();
    };

    let header_token = match req.headers().get(CSRF_HEADER).map(|v| v.to_str()) {
        Some(Ok(token)) => token.to_string(),
        Some(Err(_)) => {
            return AppError::Authentication("Invalid CSRF token format".to_string())
                .into_response();
        }
        None => {
            tracing::warn!("❌ CSRF: missing x-csrf-token header");
            return AppError::Authentication("Missing CSRF token header".to_string())
                .into_response();
        }
    };

    if !tokens_match(&cookie_token, &header_token) {
        tracing::warn!("❌ CSRF: token mismatch");
        return AppError::Authentication("CSRF token mismatch".to_string()).into_response();
    }

    match state
        .redis
        .get::<_, Option<String>>(csrf::redis_key(&cookie_token))
        .await
    {
        Ok(Some(_)) => next.run(req).await,
        Ok(None) => {
            tracing::warn!("❌ CSRF: token expired or unknown");
            AppError::Authentication("CSRF token expired or invalid".to_string()).into_response()
        }
        Err(e) => AppError::Redis(e).into_response(),
    }
}
