use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application-level error taxonomy. The (external) routing layer maps
/// these onto HTTP-equivalent statuses via `status()` and renders the
/// caller-facing body via `payload()`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing/invalid field, invalid type, self-transfer, duplicate name.
    #[error("{0}")]
    Validation(String),

    /// Delete blocked by existing references.
    #[error("{0}")]
    Conflict(String),

    /// The resource belongs to a different user.
    #[error("{0}")]
    Forbidden(String),

    /// A referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected. Full detail stays server-side; callers only
    /// ever see an opaque correlation id.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Caller-facing error body: `{ "error": <message> }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl AppError {
    /// HTTP-equivalent status for this error.
    pub fn status(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => 400,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::Internal(_) => 500,
        }
    }

    /// Render the caller-facing payload. Internal errors are logged with
    /// their full chain and replaced by a correlation reference.
    pub fn payload(&self) -> ErrorPayload {
        match self {
            AppError::Internal(source) => {
                let reference = Uuid::new_v4();
                tracing::error!(%reference, error = ?source, "internal error");
                ErrorPayload {
                    error: format!("unexpected error (ref: {reference})"),
                }
            }
            other => ErrorPayload {
                error: other.to_string(),
            },
        }
    }
}
