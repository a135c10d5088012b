//! The document store trait.

use crate::batch::WriteBatch;
use crate::error::StoreResult;
use crate::path::DocumentRef;
use crate::value::{Document, Fields};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Time assigned to every server timestamp in the commit.
    pub commit_time: DateTime<Utc>,
}

/// A collection-scoped document database.
///
/// Implementations wrap the external database client. The backend relies on
/// three guarantees from every implementation:
///
/// - `commit` is all-or-nothing across every write in the batch
/// - [`FieldValue::ServerTimestamp`](crate::FieldValue::ServerTimestamp) is
///   resolved by the store, not the caller
/// - [`FieldValue::ArrayAppend`](crate::FieldValue::ArrayAppend) merges into
///   the stored array without a client-side read, so concurrent appends to the
///   same document are all kept
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document. A missing document is `Ok(None)`.
    async fn get(&self, doc: &DocumentRef) -> StoreResult<Option<Document>>;

    /// Creates a document with a store-generated id in `collection`.
    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<DocumentRef>;

    /// Commits a batch atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReceipt>;

    /// Creates a document, failing if it already exists.
    async fn create(&self, doc: &DocumentRef, fields: Fields) -> StoreResult<CommitReceipt> {
        let mut batch = WriteBatch::new();
        batch.create(doc.clone(), fields);
        self.commit(batch).await
    }

    /// Overwrites a document.
    async fn set(&self, doc: &DocumentRef, fields: Fields) -> StoreResult<CommitReceipt> {
        let mut batch = WriteBatch::new();
        batch.set(doc.clone(), fields);
        self.commit(batch).await
    }

    /// Merges fields into an existing document.
    async fn update(&self, doc: &DocumentRef, fields: Fields) -> StoreResult<CommitReceipt> {
        let mut batch = WriteBatch::new();
        batch.update(doc.clone(), fields);
        self.commit(batch).await
    }

    /// Deletes a document if present.
    async fn delete(&self, doc: &DocumentRef) -> StoreResult<CommitReceipt> {
        let mut batch = WriteBatch::new();
        batch.delete(doc.clone());
        self.commit(batch).await
    }
}
