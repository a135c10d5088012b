//! The identity verifier contract and its local implementation.

use crate::directory::{UserDirectory, UserRecord};
use crate::error::{IdentityError, IdentityResult};
use crate::token::{AuthConfig, TokenAuthority};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Custom claims attached to a user, as a JSON object.
pub type Claims = Map<String, Value>;

/// The verified identity of a caller, valid for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerIdentity {
    /// Stable user id.
    pub uid: String,
    /// Claims carried by the presented token.
    pub claims: Claims,
}

impl CallerIdentity {
    /// Returns a string claim, if present.
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// The scheme match is case-insensitive. The token must be a single
/// non-empty word.
///
/// # Errors
///
/// Returns [`IdentityError::Malformed`] if the value is not `Bearer <token>`.
pub fn bearer_token(header: &str) -> IdentityResult<&str> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| IdentityError::Malformed("expected 'Bearer <token>'".into()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(IdentityError::Malformed(format!(
            "unsupported scheme: {scheme}"
        )));
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(IdentityError::Malformed("expected a single token".into()));
    }
    Ok(token)
}

/// An identity service that authenticates callers and manages their claims.
///
/// Implementations wrap the external trust anchor; the backend only needs
/// these three calls.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies a bearer token and returns the caller it identifies.
    async fn verify(&self, token: &str) -> IdentityResult<CallerIdentity>;

    /// Looks up a user. A missing user is `Ok(None)`.
    async fn lookup_user(&self, uid: &str) -> IdentityResult<Option<UserRecord>>;

    /// Replaces a user's custom claims.
    async fn set_custom_claims(&self, uid: &str, claims: Claims) -> IdentityResult<()>;
}

/// In-process identity service: a token authority plus a user directory.
///
/// Tokens whose subject has been removed from the directory are rejected
/// even if their signature and age are valid.
#[derive(Debug)]
pub struct LocalIdentityService {
    authority: TokenAuthority,
    directory: Arc<UserDirectory>,
}

impl LocalIdentityService {
    /// Creates a service with an empty directory.
    pub fn new(config: AuthConfig) -> Self {
        Self::with_directory(config, Arc::new(UserDirectory::new()))
    }

    /// Creates a service over an existing directory.
    pub fn with_directory(config: AuthConfig, directory: Arc<UserDirectory>) -> Self {
        Self {
            authority: TokenAuthority::new(config),
            directory,
        }
    }

    /// Returns the user directory.
    pub fn directory(&self) -> &Arc<UserDirectory> {
        &self.directory
    }

    /// Returns the token authority.
    pub fn authority(&self) -> &TokenAuthority {
        &self.authority
    }

    /// Issues a token for a known user, carrying their current claims.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnknownUser`] if the user does not exist.
    pub fn issue_token(&self, uid: &str) -> IdentityResult<String> {
        let record = self
            .directory
            .get(uid)
            .ok_or_else(|| IdentityError::UnknownUser(uid.to_string()))?;
        self.authority.issue(&record.uid, &record.claims)
    }
}

#[async_trait]
impl IdentityVerifier for LocalIdentityService {
    async fn verify(&self, token: &str) -> IdentityResult<CallerIdentity> {
        let caller = self.authority.validate(token)?;
        if !self.directory.contains(&caller.uid) {
            return Err(IdentityError::UnknownUser(caller.uid));
        }
        Ok(caller)
    }

    async fn lookup_user(&self, uid: &str) -> IdentityResult<Option<UserRecord>> {
        Ok(self.directory.get(uid))
    }

    async fn set_custom_claims(&self, uid: &str, claims: Claims) -> IdentityResult<()> {
        self.directory.set_claims(uid, claims)?;
        tracing::debug!(uid, "custom claims updated");
        Ok(())
    }
}
