//! Error types for Parlor
//!
//! One crate-wide taxonomy so handlers can bubble failures with `?` and
//! the HTTP layer can render them uniformly. Store failures are kept
//! distinct from "not found": a `Database` error means the outcome of the
//! operation is unknown, not that the document is absent.

use hyper::StatusCode;

/// Main error type for Parlor operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No credential was presented on a protected route
    #[error("no credential provided")]
    MissingCredential,

    /// Credential was presented but failed verification.
    ///
    /// Malformed, tampered, and expired tokens all collapse into this one
    /// variant so the response never reveals which check failed. Failed
    /// logins use it too, for the same reason.
    #[error("invalid credential")]
    InvalidCredential,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Underlying persistence failure; the operation's outcome is unknown
    #[error("store unavailable: {0}")]
    Database(String),

    /// A cascading delete failed after at least one step had completed.
    ///
    /// The account is left partially deleted; `completed` names the steps
    /// that did go through so the caller can retry or alert.
    #[error("account partially deleted (completed: {completed}): {source}")]
    PartialDelete {
        completed: String,
        #[source]
        source: Box<ApiError>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential | Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PartialDelete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidCredential
    }
}

/// Result type alias for Parlor operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_unauthorized() {
        assert_eq!(
            ApiError::MissingCredential.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidCredential.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn ownership_failure_is_distinct_from_absence() {
        assert_eq!(
            ApiError::Forbidden("not the author".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("post".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn store_failure_is_distinct_from_not_found() {
        assert_eq!(
            ApiError::Database("connection reset".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn partial_delete_names_completed_steps() {
        let err = ApiError::PartialDelete {
            completed: "posts".into(),
            source: Box::new(ApiError::Database("timeout".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("posts"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
