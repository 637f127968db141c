use axum::http::StatusCode;

use super::repository::RepositoryError;

/// Error taxonomy shared by every review operation.
///
/// Validation and not-found failures abort only the operation that raised them. Conflicts
/// come from scoped unique keys and can be retried with a corrected identity. Partial batch
/// failures are never errors; they are reported through `ImportReport`.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl ReviewError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ReviewError::NotFound(_) => StatusCode::NOT_FOUND,
            ReviewError::Conflict(_) => StatusCode::CONFLICT,
            ReviewError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ReviewError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::NotFound(message) => Self::NotFound(message),
            unavailable @ RepositoryError::Unavailable(_) => Self::Repository(unavailable),
        }
    }
}
