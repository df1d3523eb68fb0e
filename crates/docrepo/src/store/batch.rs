//! Queued writes committed as one atomic group.

use serde_json::Value;

use crate::types::DocumentId;

/// Precondition attached to a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precondition {
    /// Delete unconditionally; deleting a missing document is a no-op.
    #[default]
    None,
    /// The document must exist.
    Exists,
}

/// A single pending write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert a new document; fails if the identifier is taken.
    Create {
        collection: String,
        id: DocumentId,
        data: Value,
    },
    /// Merge fields into an existing document; fails if it is missing.
    Update {
        collection: String,
        id: DocumentId,
        data: Value,
    },
    /// Remove a document.
    Delete {
        collection: String,
        id: DocumentId,
        precondition: Precondition,
    },
}

impl WriteOp {
    /// Create a create operation
    pub fn create(collection: impl Into<String>, id: DocumentId, data: Value) -> Self {
        Self::Create {
            collection: collection.into(),
            id,
            data,
        }
    }

    /// Create an update operation
    pub fn update(collection: impl Into<String>, id: DocumentId, data: Value) -> Self {
        Self::Update {
            collection: collection.into(),
            id,
            data,
        }
    }

    /// Create a delete operation
    pub fn delete(collection: impl Into<String>, id: DocumentId, precondition: Precondition) -> Self {
        Self::Delete {
            collection: collection.into(),
            id,
            precondition,
        }
    }

    /// Returns the target collection.
    pub fn collection(&self) -> &str {
        match self {
            Self::Create { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }

    /// Returns the target document identifier.
    pub fn id(&self) -> &DocumentId {
        match self {
            Self::Create { id, .. } | Self::Update { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    /// Returns a short name of the operation kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Ordered list of pending writes.
///
/// Operations are applied in insertion order when committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an operation.
    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// Queues a create.
    pub fn create(&mut self, collection: impl Into<String>, id: DocumentId, data: Value) {
        self.push(WriteOp::create(collection, id, data));
    }

    /// Queues an update.
    pub fn update(&mut self, collection: impl Into<String>, id: DocumentId, data: Value) {
        self.push(WriteOp::update(collection, id, data));
    }

    /// Queues a delete.
    pub fn delete(
        &mut self,
        collection: impl Into<String>,
        id: DocumentId,
        precondition: Precondition,
    ) {
        self.push(WriteOp::delete(collection, id, precondition));
    }

    /// Returns the queued operations.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Returns the number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl IntoIterator for WriteBatch {
    type Item = WriteOp;
    type IntoIter = std::vec::IntoIter<WriteOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}
