//! Error types for the HTTP service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hemolink_identity::IdentityError;
use hemolink_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Message returned to callers in place of internal error detail.
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// Errors surfaced by service operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The caller did not present a valid credential.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller's role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request body or path failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced owner does not exist in the identity system.
    #[error("unknown owner: {0}")]
    UnknownOwner(String),

    /// A collaborator failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Maps a token verification failure.
    ///
    /// Failures of the identity service itself stay internal; everything else
    /// means the caller is not authenticated.
    pub fn unauthenticated(err: IdentityError) -> Self {
        if err.is_authentication_failure() {
            ServiceError::Unauthenticated(err.to_string())
        } else {
            ServiceError::Internal(err.to_string())
        }
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::UnknownOwner(_) => "unknown_owner",
            ServiceError::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::UnknownOwner(_) => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServiceError::Internal(_))
    }

    /// Builds the envelope sent to the caller. Internal detail is withheld.
    pub fn envelope(&self) -> ErrorEnvelope {
        let message = match self {
            ServiceError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            ServiceError::Unauthenticated(m)
            | ServiceError::Forbidden(m)
            | ServiceError::InvalidInput(m)
            | ServiceError::UnknownOwner(m) => m.clone(),
        };
        ErrorEnvelope {
            kind: self.kind().to_string(),
            message,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::UnknownUser(uid) => {
                ServiceError::UnknownOwner(format!("no such user: {uid}"))
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// The body of every failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind, see [`ServiceError::kind`].
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "request rejected");
        }
        (self.status(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServiceError::InvalidInput("bad".into()).is_client_error());
        assert!(ServiceError::Internal("oops".into()).is_server_error());
        assert!(!ServiceError::Forbidden("no".into()).is_server_error());
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (ServiceError::Unauthenticated(String::new()), 401, "unauthenticated"),
            (ServiceError::Forbidden(String::new()), 403, "forbidden"),
            (ServiceError::InvalidInput(String::new()), 400, "invalid_input"),
            (ServiceError::UnknownOwner(String::new()), 404, "unknown_owner"),
            (ServiceError::Internal(String::new()), 500, "internal"),
        ];
        for (err, status, kind) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn internal_detail_is_withheld() {
        let err = ServiceError::from(StoreError::Unavailable("db-host-7 refused".into()));
        let envelope = err.envelope();
        assert_eq!(envelope.kind, "internal");
        assert_eq!(envelope.message, INTERNAL_MESSAGE);
        assert!(err.to_string().contains("db-host-7"));
    }

    #[test]
    fn verification_failures() {
        assert!(matches!(
            ServiceError::unauthenticated(IdentityError::Expired),
            ServiceError::Unauthenticated(_)
        ));
        assert!(matches!(
            ServiceError::unauthenticated(IdentityError::Internal("down".into())),
            ServiceError::Internal(_)
        ));
    }

    #[test]
    fn unknown_user_is_unknown_owner() {
        let err = ServiceError::from(IdentityError::UnknownUser("donor-9".into()));
        assert!(matches!(err, ServiceError::UnknownOwner(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
