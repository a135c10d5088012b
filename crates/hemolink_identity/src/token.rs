//! Signed bearer tokens.
//!
//! Tokens carry the subject uid, the issue time in Unix milliseconds, and a
//! snapshot of the subject's custom claims, signed with HMAC-SHA256.

use crate::error::{IdentityError, IdentityResult};
use crate::verifier::{CallerIdentity, Claims};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(60 * 60), // 1 hour
        }
    }

    /// Sets the token expiration duration.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_expiry", &self.token_expiry)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: String,
    iat_ms: u64,
    #[serde(default)]
    claims: Claims,
}

/// Issues and validates bearer tokens.
#[derive(Clone, Debug)]
pub struct TokenAuthority {
    config: AuthConfig,
}

impl TokenAuthority {
    /// Creates a new token authority.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issues a token for `uid`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Malformed`] for an empty uid.
    pub fn issue(&self, uid: &str, claims: &Claims) -> IdentityResult<String> {
        self.issue_at(uid, claims, now_millis())
    }

    /// Issues a token with an explicit issue time in Unix milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Malformed`] for an empty uid.
    pub fn issue_at(&self, uid: &str, claims: &Claims, iat_ms: u64) -> IdentityResult<String> {
        if uid.is_empty() {
            return Err(IdentityError::Malformed("empty subject".into()));
        }
        let payload = TokenPayload {
            sub: uid.to_string(),
            iat_ms,
            claims: claims.clone(),
        };
        let payload = serde_json::to_vec(&payload)
            .map_err(|e| IdentityError::Internal(format!("encode token payload: {e}")))?;

        let mut mac = self.mac()?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Validates a token and returns the identity it asserts.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Malformed`] if the token cannot be decoded
    /// - [`IdentityError::InvalidSignature`] if the signature does not match
    /// - [`IdentityError::Expired`] if the token is older than the expiry
    pub fn validate(&self, token: &str) -> IdentityResult<CallerIdentity> {
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| IdentityError::Malformed("missing signature".into()))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| IdentityError::Malformed("payload is not base64url".into()))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| IdentityError::Malformed("signature is not base64url".into()))?;

        // Verify signature before trusting any payload content
        let mut mac = self.mac()?;
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| IdentityError::InvalidSignature)?;

        let payload: TokenPayload = serde_json::from_slice(&payload)
            .map_err(|_| IdentityError::Malformed("payload is not a token body".into()))?;
        if payload.sub.is_empty() {
            return Err(IdentityError::Malformed("empty subject".into()));
        }

        // Check expiration
        let expiry_millis =
            u64::try_from(self.config.token_expiry.as_millis()).unwrap_or(u64::MAX);
        if now_millis() > payload.iat_ms.saturating_add(expiry_millis) {
            return Err(IdentityError::Expired);
        }

        Ok(CallerIdentity {
            uid: payload.sub,
            claims: payload.claims,
        })
    }

    fn mac(&self) -> IdentityResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| IdentityError::Internal(format!("hmac key: {e}")))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
