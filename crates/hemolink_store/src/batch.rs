//! Atomic write batches.

use crate::path::DocumentRef;
use crate::value::Fields;

/// A single document write.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Creates a document; fails if it already exists.
    Create {
        /// Target document.
        doc: DocumentRef,
        /// Initial fields.
        fields: Fields,
    },
    /// Replaces a document, creating it if absent.
    Set {
        /// Target document.
        doc: DocumentRef,
        /// Replacement fields.
        fields: Fields,
    },
    /// Merges fields into an existing document; fails if it is absent.
    Update {
        /// Target document.
        doc: DocumentRef,
        /// Fields to overwrite or transform.
        fields: Fields,
    },
    /// Removes a document. Removing a missing document is not an error.
    Delete {
        /// Target document.
        doc: DocumentRef,
    },
}

impl Write {
    /// Returns the document this write targets.
    pub fn target(&self) -> &DocumentRef {
        match self {
            Write::Create { doc, .. }
            | Write::Set { doc, .. }
            | Write::Update { doc, .. }
            | Write::Delete { doc } => doc,
        }
    }

    /// Short name of the write kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Write::Create { .. } => "create",
            Write::Set { .. } => "set",
            Write::Update { .. } => "update",
            Write::Delete { .. } => "delete",
        }
    }
}

/// An ordered group of writes committed all-or-nothing.
///
/// Either every write becomes visible or none does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a create-if-absent write.
    pub fn create(&mut self, doc: DocumentRef, fields: Fields) -> &mut Self {
        self.writes.push(Write::Create { doc, fields });
        self
    }

    /// Adds an overwrite.
    pub fn set(&mut self, doc: DocumentRef, fields: Fields) -> &mut Self {
        self.writes.push(Write::Set { doc, fields });
        self
    }

    /// Adds a must-exist merge.
    pub fn update(&mut self, doc: DocumentRef, fields: Fields) -> &mut Self {
        self.writes.push(Write::Update { doc, fields });
        self
    }

    /// Adds a delete.
    pub fn delete(&mut self, doc: DocumentRef) -> &mut Self {
        self.writes.push(Write::Delete { doc });
        self
    }

    /// Returns the number of writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if the batch has no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Returns the writes in commit order.
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Consumes the batch, returning its writes.
    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}
