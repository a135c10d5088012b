//! Known users and their custom claims.

use crate::error::{IdentityError, IdentityResult};
use crate::verifier::Claims;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A user known to the identity system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable user id.
    pub uid: String,
    /// Custom claims attached to the user's future tokens.
    #[serde(default)]
    pub claims: Claims,
}

impl UserRecord {
    /// Creates a user with no custom claims.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            claims: Claims::new(),
        }
    }
}

/// Thread-safe registry of users.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl UserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.uid.clone(), record);
    }

    /// Returns a user by id.
    pub fn get(&self, uid: &str) -> Option<UserRecord> {
        self.users.read().get(uid).cloned()
    }

    /// Returns true if the user exists.
    pub fn contains(&self, uid: &str) -> bool {
        self.users.read().contains_key(uid)
    }

    /// Replaces a user's custom claims.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnknownUser`] if the user does not exist.
    pub fn set_claims(&self, uid: &str, claims: Claims) -> IdentityResult<()> {
        match self.users.write().get_mut(uid) {
            Some(record) => {
                record.claims = claims;
                Ok(())
            }
            None => Err(IdentityError::UnknownUser(uid.to_string())),
        }
    }

    /// Removes a user.
    pub fn remove(&self, uid: &str) -> Option<UserRecord> {
        self.users.write().remove(uid)
    }

    /// Returns the number of users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns true if there are no users.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_and_lookup() {
        let directory = UserDirectory::new();
        assert!(directory.is_empty());

        directory.insert(UserRecord::new("donor-1"));
        assert!(directory.contains("donor-1"));
        assert!(!directory.contains("donor-2"));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn set_claims_replaces() {
        let directory = UserDirectory::new();
        directory.insert(UserRecord::new("nurse-1"));

        let mut claims = Claims::new();
        claims.insert("role".into(), json!("medical_staff"));
        directory.set_claims("nurse-1", claims.clone()).unwrap();

        assert_eq!(directory.get("nurse-1").unwrap().claims, claims);
    }

    #[test]
    fn set_claims_unknown_user() {
        let directory = UserDirectory::new();
        let err = directory.set_claims("ghost", Claims::new()).unwrap_err();
        assert!(matches!(err, IdentityError::UnknownUser(uid) if uid == "ghost"));
    }

    #[test]
    fn record_deserializes_without_claims() {
        let record: UserRecord = serde_json::from_value(json!({"uid": "donor-1"})).unwrap();
        assert!(record.claims.is_empty());
    }
}
