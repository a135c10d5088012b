//! Issue-token command implementation.

use hemolink_identity::{AuthConfig, Claims, TokenAuthority};
use hemolink_server::{Role, ROLE_CLAIM};
use serde_json::Value;

/// Runs the issue-token command, printing the token to stdout.
///
/// The token only verifies against a server whose directory knows `uid`.
pub fn run(secret: &str, uid: &str, role: Option<Role>) -> Result<(), Box<dyn std::error::Error>> {
    if secret.is_empty() {
        return Err("token secret must not be empty".into());
    }
    let authority = TokenAuthority::new(AuthConfig::new(secret.as_bytes().to_vec()));

    let mut claims = Claims::new();
    if let Some(role) = role {
        claims.insert(ROLE_CLAIM.to_string(), Value::from(role.as_str()));
    }
    let token = authority.issue(uid, &claims)?;
    println!("{token}");
    Ok(())
}
