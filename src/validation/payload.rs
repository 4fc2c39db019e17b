use axum::extract::FromRequest;
use garde::Validate;

use crate::error::{AppError, Result};

/// A JSON body whose rejections (bad syntax, unknown enum values, malformed
/// times) surface as `AppError::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Payload<T>(pub T);

/// Runs the payload's garde rules, turning the report into a validation error.
pub fn validated<T>(payload: T) -> Result<T>
where
    T: Validate,
    T::Context: Default,
{
    payload
        .validate()
        .map_err(|report| AppError::Validation(report.to_string().trim().to_string()))?;
    Ok(payload)
}
