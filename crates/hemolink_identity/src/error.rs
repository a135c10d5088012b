//! Error types for identity operations.

use thiserror::Error;

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors that can occur while verifying callers or managing users.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// No credential was presented.
    #[error("missing credential")]
    MissingCredential,

    /// The credential is not a well-formed bearer token.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token signature does not match.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token is past its expiry.
    #[error("token expired")]
    Expired,

    /// The user does not exist in the directory.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// The identity service failed.
    #[error("identity service error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Returns true if the caller failed to prove who they are.
    ///
    /// Everything except [`IdentityError::Internal`] is an authentication
    /// failure; internal errors say nothing about the caller.
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, IdentityError::Internal(_))
    }
}
