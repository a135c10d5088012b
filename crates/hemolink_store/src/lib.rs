//! # Hemolink Store
//!
//! Document store contract used by the Hemolink backend.
//!
//! The backend never owns its data. Role records, blood requests and the
//! donation ledger all live in an external document database, and this crate
//! describes the small slice of that database the backend relies on:
//!
//! - Collection-scoped documents addressed by [`DocumentRef`]
//! - Single-document `get` / `add` / `create` / `set` / `update` / `delete`
//! - All-or-nothing [`WriteBatch`] commits
//! - Server-assigned timestamps ([`FieldValue::ServerTimestamp`])
//! - A concurrency-safe array append ([`FieldValue::ArrayAppend`])
//!
//! [`MemoryStore`] is the in-process reference implementation. It is used for
//! local development and as the test double for the HTTP layer, and it can
//! inject faults into commits to exercise atomicity.
//!
//! ## Example
//!
//! ```rust
//! use hemolink_store::{DocumentRef, DocumentStore, FieldValue, Fields, MemoryStore, WriteBatch};
//!
//! # tokio_test_block_on(async {
//! let store = MemoryStore::new();
//! let unit = DocumentRef::new("blockchain_ledger", "BU-1").unwrap();
//!
//! let mut fields = Fields::new();
//! fields.insert("currentStatus".into(), FieldValue::from("Verified"));
//! fields.insert("createdAt".into(), FieldValue::ServerTimestamp);
//!
//! let mut batch = WriteBatch::new();
//! batch.create(unit.clone(), fields);
//! store.commit(batch).await.unwrap();
//!
//! let doc = store.get(&unit).await.unwrap().unwrap();
//! assert_eq!(doc.get("currentStatus").unwrap(), "Verified");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod batch;
mod error;
mod memory;
mod path;
mod store;
mod value;

pub use batch::{Write, WriteBatch};
pub use error::{StoreError, StoreResult};
pub use memory::{FaultPlan, MemoryStore};
pub use path::DocumentRef;
pub use store::{CommitReceipt, DocumentStore};
pub use value::{to_fields, Document, FieldValue, Fields};
