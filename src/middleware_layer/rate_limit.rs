use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::aio::ConnectionManager;
use sonic_rs::JsonValueTrait;
use std::net::SocketAddr;

use crate::{error::AppError, state::AppState};

/// Registrations allowed per IP within the window.
const REGISTER_LIMIT: i64 = 5;
/// Failed logins allowed per email within the window.
const LOGIN_FAILURE_LIMIT: i64 = 5;
/// Counter lifetime in seconds.
const WINDOW_SECS: i64 = 43200;
/// Upper bound on a login body we are willing to buffer.
const MAX_LOGIN_BODY: usize = 16 * 1024;

fn extract_real_ip(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn login_key(body: &[u8]) -> String {
    let email = sonic_rs::from_slice::<sonic_rs::Value>(body)
        .ok()
        .and_then(|json| json.get("email").and_then(|v| v.as_str()).map(|s| s.trim().to_lowercase()))
        .unwrap_or_else(|| "unknown".to_string());
    format!("rate_limit:login:{}", email)
}

async fn attempts(redis: &mut ConnectionManager, key: &str) -> i64 {
    redis::cmd("GET")
        .arg(key)
        .query_async::<Option<i64>>(redis)
        .await
        .ok()
        .flatten()
        .unwrap_or(0)
}

async fn minutes_left(redis: &mut ConnectionManager, key: &str) -> i64 {
    let ttl = redis::cmd("TTL")
        .arg(key)
        .query_async::<Option<i64>>(redis)
        .await
        .ok()
        .flatten()
        .unwrap_or(0);
    (ttl.max(0) + 59) / 60
}

async fn bump(redis: &mut ConnectionManager, key: &str) {
    let counted: redis::RedisResult<()> = redis::pipe()
        .cmd("INCR")
        .arg(key)
        .ignore()
        .cmd("EXPIRE")
        .arg(key)
        .arg(WINDOW_SECS)
        .ignore()
        .query_async(redis)
        .await;
    if let Err(e) = counted {
        tracing::error!("❌ Rate limit counter {} not updated: {}", key, e);
    }
}

/// Limits account creation per client IP.
pub async fn rate_limit_register(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = format!("rate_limit:register:{}", extract_real_ip(&req));
    let mut redis = state.redis.clone();

    if attempts(&mut redis, &key).await >= REGISTER_LIMIT {
        return AppError::RateLimitExceeded(format!(
            "Registration limit exceeded. Try again in {} minutes",
            minutes_left(&mut redis, &key).await
        ))
        .into_response();
    }

    let response = next.run(req).await;
    if response.status().is_success() {
        bump(&mut redis, &key).await;
    }
    response
}

/// Limits failed logins per email. A successful login clears the counter.
pub async fn rate_limit_login(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_LOGIN_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::Validation("Request body too large".to_string()).into_response();
        }
    };

    let key = login_key(&body_bytes);
    let mut redis = state.redis.clone();

    if attempts(&mut redis, &key).await >= LOGIN_FAILURE_LIMIT {
        return AppError::RateLimitExceeded(format!(
            "Too many failed login attempts. Try again in {} minutes",
            minutes_left(&mut redis, &key).await
        ))
        .into_response();
    }

    let response = next
        .run(Request::from_parts(parts, Body::from(body_bytes)))
        .await;

    if response.status().is_client_error() {
        bump(&mut redis, &key).await;
    } else if response.status().is_success() {
        let _: redis::RedisResult<()> = redis::cmd("DEL").arg(&key).query_async(&mut redis).await;
    }

    response
}
