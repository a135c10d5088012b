//! Shared-secret authentication for server-to-server callbacks.

use crate::error::{IdentityError, IdentityResult};
use std::fmt;
use subtle::ConstantTimeEq;

/// A shared secret presented by a trusted caller.
#[derive(Clone)]
pub struct WebhookSecret {
    secret: Vec<u8>,
}

impl WebhookSecret {
    /// Creates a validator for the given secret.
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Checks a presented secret in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidSignature`] if the secret does not match.
    pub fn validate(&self, presented: &[u8]) -> IdentityResult<()> {
        if bool::from(presented.ct_eq(&self.secret)) {
            Ok(())
        } else {
            Err(IdentityError::InvalidSignature)
        }
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_secret() {
        let secret = WebhookSecret::new(b"shared-secret".to_vec());

        assert!(secret.validate(b"shared-secret").is_ok());
        assert!(secret.validate(b"wrong-secret").is_err());
        assert!(secret.validate(b"shared-secre").is_err());
        assert!(secret.validate(b"").is_err());
    }

    #[test]
    fn debug_redacts() {
        let secret = WebhookSecret::new(b"shared-secret".to_vec());
        assert!(!format!("{secret:?}").contains("shared"));
    }
}
