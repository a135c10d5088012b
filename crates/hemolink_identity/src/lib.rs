//! # Hemolink Identity
//!
//! Identity verification for the Hemolink backend.
//!
//! This crate provides:
//! - The [`IdentityVerifier`] contract the HTTP layer depends on
//! - [`TokenAuthority`]: HMAC-SHA256 signed bearer tokens with expiry
//! - [`UserDirectory`]: known users and their custom claims
//! - [`LocalIdentityService`]: an in-process verifier built from the two
//! - [`WebhookSecret`]: shared-secret check for server-to-server callbacks
//!
//! # Token Format
//!
//! ```text
//! base64url(payload) "." base64url(HMAC-SHA256(secret, payload))
//! ```
//!
//! where `payload` is the JSON object `{"sub", "iat_ms", "claims"}`.
//!
//! # Example
//!
//! ```rust
//! use hemolink_identity::{AuthConfig, Claims, TokenAuthority};
//!
//! let authority = TokenAuthority::new(AuthConfig::new(b"a-long-random-secret".to_vec()));
//! let token = authority.issue("donor-7", &Claims::new()).unwrap();
//! let caller = authority.validate(&token).unwrap();
//! assert_eq!(caller.uid, "donor-7");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod directory;
mod error;
mod token;
mod verifier;
mod webhook;

pub use directory::{UserDirectory, UserRecord};
pub use error::{IdentityError, IdentityResult};
pub use token::{AuthConfig, TokenAuthority};
pub use verifier::{bearer_token, CallerIdentity, Claims, IdentityVerifier, LocalIdentityService};
pub use webhook::WebhookSecret;
