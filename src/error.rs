use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::availability::AvailabilityBlock;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The pool could not be built from the configuration.
    #[error("Pool configuration error: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An authentication error.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The caller may not perform this operation.
    #[error("Authorization failed")]
    Unauthorized,

    /// A resource not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A new availability block overlaps one the mentor already has.
    #[error(
        "Availability overlaps existing block {} ({} {}-{})",
        .0.id, .0.day_of_week, .0.start_time, .0.end_time
    )]
    Overlap(Box<AvailabilityBlock>),

    /// The storage layer rejected an overlapping block without naming it.
    #[error("Availability overlaps an existing block")]
    OverlapDetected,

    /// The slot is already booked.
    #[error("Slot already booked")]
    Collision,

    /// A uniqueness rule other than slot booking was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// A rate limit exceeded error.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::CreatePool(_)
            | AppError::Redis(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Overlap(_)
            | AppError::OverlapDetected
            | AppError::Collision
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// SQLSTATE of a failed statement, when the failure came from the server.
pub(crate) fn sql_state(err: &tokio_postgres::Error) -> Option<&tokio_postgres::error::SqlState> {
    err.as_db_error().map(|db| db.code())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                sonic_rs::json!({ "error": "Database error" })
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                sonic_rs::json!({ "error": "Database unavailable" })
            }

            AppError::CreatePool(ref e) => {
                tracing::error!("Pool configuration error: {}", e);
                sonic_rs::json!({ "error": "Database unavailable" })
            }

            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                sonic_rs::json!({ "error": "Cache error" })
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                sonic_rs::json!({ "error": msg })
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                sonic_rs::json!({ "error": "Forbidden" })
            }

            AppError::NotFound(ref what) => {
                tracing::debug!("Not found: {}", what);
                sonic_rs::json!({ "error": format!("{} not found", what) })
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                sonic_rs::json!({ "error": msg })
            }

            AppError::Overlap(ref block) => {
                tracing::debug!("Availability overlap with block {}", block.id);
                sonic_rs::json!({
                    "error": "Availability overlaps an existing block",
                    "conflicting_block": {
                        "id": block.id.to_string(),
                        "day_of_week": block.day_of_week.name(),
                        "start_time": block.start_time.to_string(),
                        "end_time": block.end_time.to_string(),
                    }
                })
            }

            AppError::OverlapDetected => {
                sonic_rs::json!({ "error": "Availability overlaps an existing block" })
            }

            AppError::Collision => sonic_rs::json!({ "error": "Slot already booked" }),

            AppError::Conflict(ref msg) => {
                tracing::debug!("Conflict: {}", msg);
                sonic_rs::json!({ "error": msg })
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                sonic_rs::json!({ "error": "Internal server error" })
            }

            AppError::RateLimitExceeded(ref msg) => {
                tracing::warn!("Rate limit exceeded: {}", msg);
                sonic_rs::json!({ "error": msg })
            }
        };

        let body = sonic_rs::to_string(&body)
            .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
