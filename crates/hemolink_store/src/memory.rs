//! In-memory document store.

use crate::batch::{Write, WriteBatch};
use crate::error::{StoreError, StoreResult};
use crate::path::DocumentRef;
use crate::store::{CommitReceipt, DocumentStore};
use crate::value::{Document, FieldValue, Fields};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

type DocumentData = Map<String, Value>;

/// Faults to inject into a [`MemoryStore`].
///
/// Commit and read faults fire once and are then cleared. `unavailable`
/// stays in effect until [`MemoryStore::clear_faults`] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Fail the next commit once this many of its writes have been staged.
    pub fail_commit_after: Option<usize>,
    /// Fail the next read.
    pub fail_next_get: bool,
    /// Fail every operation.
    pub unavailable: bool,
}

impl FaultPlan {
    /// A plan that injects nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Fails the next commit after `writes` writes are staged.
    ///
    /// `0` fails before the first write; a value at or beyond the batch
    /// length fails just before the batch is published.
    pub fn fail_commit_after(writes: usize) -> Self {
        Self {
            fail_commit_after: Some(writes),
            ..Self::default()
        }
    }

    /// Fails the next read.
    pub fn fail_next_get() -> Self {
        Self {
            fail_next_get: true,
            ..Self::default()
        }
    }

    /// Fails every operation until cleared.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

/// A thread-safe document store held entirely in memory.
///
/// Suitable for:
/// - Local development servers
/// - Unit and HTTP integration tests
/// - Fault-injection tests of batch atomicity
///
/// # Atomicity
///
/// A commit stages every write against an overlay of the documents it
/// touches. Nothing is published until every write has been staged, and the
/// publish happens under a single write lock, so readers never observe part
/// of a batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, DocumentData>>>,
    faults: Mutex<FaultPlan>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a fault plan, replacing any previous one.
    pub fn inject(&self, plan: FaultPlan) {
        *self.faults.lock() = plan;
    }

    /// Removes all injected faults.
    pub fn clear_faults(&self) {
        *self.faults.lock() = FaultPlan::none();
    }

    /// Writes a document directly, bypassing faults. Used for bootstrap data.
    pub fn seed(&self, doc: &DocumentRef, data: DocumentData) {
        self.collections
            .write()
            .entry(doc.collection().to_string())
            .or_default()
            .insert(doc.id().to_string(), data);
    }

    /// Reads a document directly, bypassing faults.
    pub fn read(&self, doc: &DocumentRef) -> Option<Document> {
        self.collections
            .read()
            .get(doc.collection())
            .and_then(|docs| docs.get(doc.id()))
            .map(|data| Document::new(doc.clone(), data.clone()))
    }

    /// Returns true if the document exists.
    pub fn contains(&self, doc: &DocumentRef) -> bool {
        self.read(doc).is_some()
    }

    /// Returns the number of documents in a collection.
    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Returns the ids in a collection, in order.
    pub fn document_ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns every document keyed by its full path.
    ///
    /// Two equal snapshots mean no write was published in between.
    pub fn snapshot(&self) -> BTreeMap<String, DocumentData> {
        self.collections
            .read()
            .iter()
            .flat_map(|(collection, docs)| {
                docs.iter()
                    .map(move |(id, data)| (format!("{collection}/{id}"), data.clone()))
            })
            .collect()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.faults.lock().unavailable {
            return Err(StoreError::Unavailable("store marked unavailable".into()));
        }
        Ok(())
    }

    fn commit_writes(&self, writes: Vec<Write>) -> StoreResult<CommitReceipt> {
        self.check_available()?;
        let fail_at = self
            .faults
            .lock()
            .fail_commit_after
            .take()
            .map(|n| n.min(writes.len()));

        let now = Utc::now();
        let mut collections = self.collections.write();
        let mut staged: HashMap<DocumentRef, Option<DocumentData>> = HashMap::new();

        for (index, write) in writes.iter().enumerate() {
            if fail_at == Some(index) {
                return Err(injected(index));
            }

            let doc = write.target();
            let current = match staged.get(doc) {
                Some(pending) => pending.clone(),
                None => collections
                    .get(doc.collection())
                    .and_then(|docs| docs.get(doc.id()))
                    .cloned(),
            };

            let next = match write {
                Write::Create { fields, .. } => {
                    if current.is_some() {
                        return Err(StoreError::AlreadyExists(doc.path()));
                    }
                    Some(apply_fields(DocumentData::new(), fields, now))
                }
                Write::Set { fields, .. } => Some(apply_fields(DocumentData::new(), fields, now)),
                Write::Update { fields, .. } => match current {
                    Some(existing) => Some(apply_fields(existing, fields, now)),
                    None => return Err(StoreError::NotFound(doc.path())),
                },
                Write::Delete { .. } => None,
            };
            staged.insert(doc.clone(), next);
        }

        if fail_at == Some(writes.len()) {
            return Err(injected(writes.len()));
        }

        for (doc, data) in staged {
            match data {
                Some(data) => {
                    collections
                        .entry(doc.collection().to_string())
                        .or_default()
                        .insert(doc.id().to_string(), data);
                }
                None => {
                    if let Some(docs) = collections.get_mut(doc.collection()) {
                        docs.remove(doc.id());
                    }
                }
            }
        }

        tracing::debug!(writes = writes.len(), "memory store commit");
        Ok(CommitReceipt { commit_time: now })
    }
}

fn injected(staged: usize) -> StoreError {
    StoreError::Unavailable(format!("injected commit fault after {staged} staged writes"))
}

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn apply_fields(mut data: DocumentData, fields: &Fields, now: DateTime<Utc>) -> DocumentData {
    for (name, value) in fields {
        let resolved = match value {
            FieldValue::Value(v) => v.clone(),
            FieldValue::ServerTimestamp => timestamp(now),
            FieldValue::ArrayAppend(items) => {
                let mut array = match data.remove(name) {
                    Some(Value::Array(existing)) => existing,
                    _ => Vec::with_capacity(items.len()),
                };
                array.extend(items.iter().cloned());
                Value::Array(array)
            }
        };
        data.insert(name.clone(), resolved);
    }
    data
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, doc: &DocumentRef) -> StoreResult<Option<Document>> {
        self.check_available()?;
        {
            let mut faults = self.faults.lock();
            if faults.fail_next_get {
                faults.fail_next_get = false;
                return Err(StoreError::Unavailable("injected read fault".into()));
            }
        }
        Ok(self.read(doc))
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<DocumentRef> {
        let doc = DocumentRef::new(collection, Uuid::new_v4().simple().to_string())?;
        self.commit_writes(vec![Write::Create {
            doc: doc.clone(),
            fields,
        }])?;
        Ok(doc)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReceipt> {
        self.commit_writes(batch.into_writes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;
    use serde_json::json;
    use std::sync::Arc;

    fn doc(collection: &str, id: &str) -> DocumentRef {
        DocumentRef::new(collection, id).unwrap()
    }

    fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryStore::new();
        let role = doc("user_roles", "u1");

        store
            .set(&role, fields(&[("role", "regular_user".into())]))
            .await
            .unwrap();
        let read = store.get(&role).await.unwrap().unwrap();
        assert_eq!(read.get("role"), Some(&json!("regular_user")));

        store.delete(&role).await.unwrap();
        assert!(store.get(&role).await.unwrap().is_none());

        // Deleting again is not an error.
        store.delete(&role).await.unwrap();
    }

    #[tokio::test]
    async fn add_generates_ids() {
        let store = MemoryStore::new();
        let a = store.add("blood_requests", Fields::new()).await.unwrap();
        let b = store.add("blood_requests", Fields::new()).await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(store.document_count("blood_requests"), 2);
    }

    #[tokio::test]
    async fn create_rejects_existing() {
        let store = MemoryStore::new();
        let unit = doc("blockchain_ledger", "BU-1");

        store.create(&unit, Fields::new()).await.unwrap();
        let err = store.create(&unit, Fields::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn update_requires_existing() {
        let store = MemoryStore::new();
        let unit = doc("blockchain_ledger", "missing");

        let err = store
            .update(&unit, fields(&[("currentStatus", "Stored".into())]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!store.contains(&unit));
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new();
        let unit = doc("blockchain_ledger", "BU-1");
        store
            .create(
                &unit,
                fields(&[
                    ("currentStatus", "Verified".into()),
                    ("bloodType", "O-".into()),
                ]),
            )
            .await
            .unwrap();

        store
            .update(&unit, fields(&[("currentStatus", "Stored".into())]))
            .await
            .unwrap();

        let read = store.read(&unit).unwrap();
        assert_eq!(read.get("currentStatus"), Some(&json!("Stored")));
        assert_eq!(read.get("bloodType"), Some(&json!("O-")));
    }

    #[tokio::test]
    async fn server_timestamp_resolved_at_commit() {
        let store = MemoryStore::new();
        let unit = doc("blood_requests", "r1");

        let receipt = store
            .set(&unit, fields(&[("createdAt", FieldValue::ServerTimestamp)]))
            .await
            .unwrap();

        let read = store.read(&unit).unwrap();
        let stamp = read.get("createdAt").and_then(Value::as_str).unwrap();
        let parsed = DateTime::parse_from_rfc3339(stamp).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), receipt.commit_time.trunc_subsecs(6));
    }

    #[tokio::test]
    async fn array_append_keeps_existing_elements() {
        let store = MemoryStore::new();
        let unit = doc("blockchain_ledger", "BU-1");
        store
            .create(
                &unit,
                fields(&[("history", FieldValue::ArrayAppend(vec![json!("a")]))]),
            )
            .await
            .unwrap();

        for item in ["b", "a"] {
            store
                .update(
                    &unit,
                    fields(&[("history", FieldValue::ArrayAppend(vec![json!(item)]))]),
                )
                .await
                .unwrap();
        }

        let read = store.read(&unit).unwrap();
        assert_eq!(read.get("history"), Some(&json!(["a", "b", "a"])));
    }

    #[tokio::test]
    async fn batch_is_atomic_under_injected_fault() {
        let store = MemoryStore::new();
        let ledger = doc("blockchain_ledger", "BU-1");
        let mirror = doc("user_profiles/d1/donation_history", "BU-1");

        let mut batch = WriteBatch::new();
        batch
            .create(ledger.clone(), fields(&[("status", "Verified".into())]))
            .create(mirror.clone(), fields(&[("status", "Verified".into())]));

        store.inject(FaultPlan::fail_commit_after(1));
        assert!(store.commit(batch.clone()).await.is_err());
        assert!(!store.contains(&ledger));
        assert!(!store.contains(&mirror));

        // The fault fires once.
        store.commit(batch).await.unwrap();
        assert!(store.contains(&ledger));
        assert!(store.contains(&mirror));
    }

    #[tokio::test]
    async fn batch_rolls_back_on_precondition_failure() {
        let store = MemoryStore::new();
        let ledger = doc("blockchain_ledger", "BU-1");
        let mirror = doc("user_profiles/d1/donation_history", "BU-1");
        store.seed(&mirror, Map::new());

        let mut batch = WriteBatch::new();
        batch
            .create(ledger.clone(), Fields::new())
            .create(mirror.clone(), Fields::new());

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert!(!store.contains(&ledger));
    }

    #[tokio::test]
    async fn fault_before_publish() {
        let store = MemoryStore::new();
        let unit = doc("user_roles", "u1");

        store.inject(FaultPlan::fail_commit_after(10));
        assert!(store.set(&unit, Fields::new()).await.is_err());
        assert!(!store.contains(&unit));
    }

    #[tokio::test]
    async fn unavailable_until_cleared() {
        let store = MemoryStore::new();
        let unit = doc("user_roles", "u1");

        store.inject(FaultPlan::unavailable());
        assert!(matches!(
            store.get(&unit).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.set(&unit, Fields::new()).await.is_err());

        store.clear_faults();
        assert!(store.get(&unit).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_fault_fires_once() {
        let store = MemoryStore::new();
        let unit = doc("user_roles", "u1");

        store.inject(FaultPlan::fail_next_get());
        assert!(store.get(&unit).await.is_err());
        assert!(store.get(&unit).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let store = Arc::new(MemoryStore::new());
        let unit = doc("blockchain_ledger", "BU-1");
        store.create(&unit, Fields::new()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32u64 {
            let store = Arc::clone(&store);
            let unit = unit.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(
                        &unit,
                        fields(&[("history", FieldValue::ArrayAppend(vec![json!(i)]))]),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let read = store.read(&unit).unwrap();
        let history = read.get("history").and_then(Value::as_array).unwrap();
        assert_eq!(history.len(), 32);
    }

    #[test]
    fn document_ids_are_sorted() {
        let store = MemoryStore::new();
        store.seed(&doc("user_roles", "b"), Map::new());
        store.seed(&doc("user_roles", "a"), Map::new());

        assert_eq!(store.document_ids("user_roles"), vec!["a", "b"]);
        assert_eq!(store.document_count("missing"), 0);
    }

    #[tokio::test]
    async fn snapshot_tracks_published_writes() {
        let store = MemoryStore::new();
        store.seed(&doc("user_roles", "a"), Map::new());
        let before = store.snapshot();
        assert_eq!(before.keys().collect::<Vec<_>>(), ["user_roles/a"]);

        store.inject(FaultPlan::fail_commit_after(0));
        assert!(store
            .set(&doc("user_roles", "b"), Fields::new())
            .await
            .is_err());
        assert_eq!(store.snapshot(), before);

        store.delete(&doc("user_roles", "a")).await.unwrap();
        assert!(store.snapshot().is_empty());
    }
}
