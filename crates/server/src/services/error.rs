//! Business-rule errors shared by the domain services.

use thiserror::Error;

use shopx_core::orders::TransitionError;

use crate::db::RepositoryError;

/// Errors returned by the domain services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested entity does not exist (or is not visible to the caller).
    #[error("{0}")]
    NotFound(String),

    /// The caller is authenticated but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    /// The request is well-formed but conflicts with the current state.
    #[error("{0}")]
    InvalidOperation(String),

    /// The request itself is malformed.
    #[error("{0}")]
    InvalidArgument(String),

    /// A unique value is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure outside the database.
    #[error("internal error: {0}")]
    Internal(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub(crate) fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} {id} not found"))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

impl From<TransitionError> for ServiceError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Forbidden(msg) => Self::Forbidden(msg),
            TransitionError::InvalidTransition(msg) => Self::InvalidOperation(msg),
        }
    }
}

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_mapping() {
        let err: ServiceError = TransitionError::Forbidden("nope".to_owned()).into();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err: ServiceError = TransitionError::InvalidTransition("late".to_owned()).into();
        assert!(matches!(err, ServiceError::InvalidOperation(ref m) if m == "late"));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            ServiceError::not_found("order", 42).to_string(),
            "order 42 not found"
        );
    }
}
