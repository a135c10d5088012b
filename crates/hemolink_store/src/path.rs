//! Document addressing.

use crate::error::{StoreError, StoreResult};
use std::fmt;

/// Longest document id the store accepts, in bytes.
const MAX_ID_BYTES: usize = 1500;

/// The address of a single document: a collection path plus a document id.
///
/// Collection paths may be nested under a parent document, for example
/// `user_profiles/{uid}/donation_history`. A valid collection path always has
/// an odd number of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    collection: String,
    id: String,
}

impl DocumentRef {
    /// Creates a document reference, validating both parts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if the collection path or the id
    /// is not addressable.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> StoreResult<Self> {
        let collection = collection.into();
        let id = id.into();
        validate_collection(&collection)?;
        validate_id(&id)?;
        Ok(Self { collection, id })
    }

    /// Checks that `id` can be used as a single path segment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] for empty ids, ids containing `/`,
    /// the reserved ids `.` and `..`, and ids longer than 1500 bytes.
    pub fn validate_id(id: &str) -> StoreResult<()> {
        validate_id(id)
    }

    /// Returns the collection path.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the document id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the full `collection/id` path.
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    /// Returns a sub-collection path under this document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if `name` is not a valid segment.
    pub fn subcollection(&self, name: &str) -> StoreResult<String> {
        validate_id(name)?;
        Ok(format!("{}/{}", self.path(), name))
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

fn validate_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidPath("empty document id".into()));
    }
    if id.contains('/') {
        return Err(StoreError::InvalidPath(format!("id contains '/': {id}")));
    }
    if id == "." || id == ".." {
        return Err(StoreError::InvalidPath(format!("reserved id: {id}")));
    }
    if id.len() > MAX_ID_BYTES {
        return Err(StoreError::InvalidPath(format!(
            "id is {} bytes, limit is {MAX_ID_BYTES}",
            id.len()
        )));
    }
    Ok(())
}

fn validate_collection(collection: &str) -> StoreResult<()> {
    let segments: Vec<&str> = collection.split('/').collect();
    if segments.len() % 2 == 0 {
        return Err(StoreError::InvalidPath(format!(
            "collection path must have an odd number of segments: {collection}"
        )));
    }
    for segment in segments {
        validate_id(segment)?;
    }
    Ok(())
}
