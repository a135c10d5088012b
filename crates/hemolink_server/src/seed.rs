//! Bootstrap data for development servers.
//!
//! A seed file lists the users known to the identity system and the role
//! records to preload:
//!
//! ```json
//! {
//!   "users": [{ "uid": "nurse-1" }, { "uid": "donor-1", "claims": {} }],
//!   "roles": { "nurse-1": "medical_staff" }
//! }
//! ```

use crate::error::ServiceResult;
use crate::model::{Role, ROLE_CLAIM};
use crate::roles::RoleStore;
use hemolink_identity::{UserDirectory, UserRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a seed file.
#[derive(Error, Debug)]
pub enum SeedError {
    /// The file could not be read.
    #[error("cannot read seed file {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a valid seed document.
    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Users and role records to load at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    /// Users to register with the identity directory.
    #[serde(default)]
    pub users: Vec<UserRecord>,
    /// Role records keyed by uid.
    #[serde(default)]
    pub roles: BTreeMap<String, Role>,
}

impl SeedData {
    /// Reads a seed file.
    ///
    /// # Errors
    ///
    /// Returns a [`SeedError`] if the file is unreadable or malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Loads the users into `directory` and the role records into `roles`.
    ///
    /// Each seeded role is also written into the user's `role` claim when
    /// the user is in the directory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ServiceError::Internal`] if the store fails.
    pub async fn apply(&self, directory: &UserDirectory, roles: &RoleStore) -> ServiceResult<()> {
        for user in &self.users {
            directory.insert(user.clone());
        }
        for (uid, role) in &self.roles {
            roles.set_role(uid, *role).await?;
            match directory.get(uid) {
                Some(mut user) => {
                    user.claims
                        .insert(ROLE_CLAIM.to_string(), Value::from(role.as_str()));
                    directory.set_claims(uid, user.claims)?;
                }
                None => tracing::warn!(uid, "seeded role for a user not in the directory"),
            }
        }
        tracing::info!(
            users = self.users.len(),
            roles = self.roles.len(),
            "seed data applied"
        );
        Ok(())
    }
}
