//! Role records keyed by caller uid.

use crate::error::ServiceResult;
use crate::model::{Role, RoleRecord, USER_ROLES};
use hemolink_store::{to_fields, DocumentRef, DocumentStore, StoreError};
use std::sync::Arc;

/// Reads and writes the `user_roles` collection.
#[derive(Clone)]
pub struct RoleStore {
    store: Arc<dyn DocumentStore>,
}

impl RoleStore {
    /// Creates an accessor over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns the caller's role.
    ///
    /// A missing record, an unaddressable uid, a record that does not decode,
    /// or a role name this service does not recognize all yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ServiceError::Internal`] if the store fails.
    pub async fn get_role(&self, uid: &str) -> ServiceResult<Option<Role>> {
        let Ok(doc) = DocumentRef::new(USER_ROLES, uid) else {
            return Ok(None);
        };
        let Some(document) = self.store.get(&doc).await? else {
            return Ok(None);
        };
        let record: RoleRecord = match document.decode() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(uid, error = %e, "ignoring unreadable role record");
                return Ok(None);
            }
        };
        match record.role.parse() {
            Ok(role) => Ok(Some(role)),
            Err(e) => {
                tracing::warn!(uid, error = %e, "ignoring unrecognized role record");
                Ok(None)
            }
        }
    }

    /// Overwrites the caller's role. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ServiceError::Internal`] if the store fails.
    pub async fn set_role(&self, uid: &str, role: Role) -> ServiceResult<()> {
        let doc = DocumentRef::new(USER_ROLES, uid)?;
        self.store.set(&doc, record_fields(role)?).await?;
        tracing::info!(uid, %role, "role set");
        Ok(())
    }

    /// Creates the caller's role record with `default` unless one exists,
    /// and returns the role now in effect.
    ///
    /// An existing record is never overwritten. If it holds a role name this
    /// service does not recognize, `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ServiceError::Internal`] if the store fails.
    pub async fn ensure_role(&self, uid: &str, default: Role) -> ServiceResult<Option<Role>> {
        let doc = DocumentRef::new(USER_ROLES, uid)?;
        match self.store.create(&doc, record_fields(default)?).await {
            Ok(_) => {
                tracing::info!(uid, role = %default, "role record created");
                Ok(Some(default))
            }
            Err(StoreError::AlreadyExists(_)) => {
                tracing::debug!(uid, "role record already present");
                self.get_role(uid).await
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn record_fields(role: Role) -> ServiceResult<hemolink_store::Fields> {
    Ok(to_fields(&RoleRecord {
        role: role.as_str().to_string(),
    })?)
}
