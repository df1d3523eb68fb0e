//! Document store contract and the in-memory reference backend.
//!
//! The managed database client itself lives outside this crate; anything that
//! implements [`DocumentStore`] can back a repository:
//! - `run_query`: filtered, ordered, limited reads
//! - `get`: point lookup by identifier
//! - `create`/`update`/`delete`: single writes with existence preconditions
//! - `commit`: atomic application of a [`WriteBatch`]

mod batch;
mod memory;
mod query;

use std::fmt;
use std::sync::Arc;

pub use batch::{Precondition, WriteBatch, WriteOp};
pub use memory::MemoryStore;
pub use query::{Limit, OrderField, Query, QueryCursor, QueryOrder};
use serde_json::Value;

use crate::Result;
use crate::types::{Document, DocumentId};

/// Storage backend for document collections.
///
/// Implementations must honour the write preconditions:
/// - `create` fails with [`Error::AlreadyExists`] if the document exists
/// - `update` fails with [`Error::NotFound`] if the document is missing
/// - `delete` with [`Precondition::Exists`] fails with [`Error::NotFound`] if missing
/// - `commit` applies every operation in order, or none of them
///
/// [`Error::AlreadyExists`]: crate::Error::AlreadyExists
/// [`Error::NotFound`]: crate::Error::NotFound
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Executes a query and returns matching documents in query order.
    async fn run_query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Fetches a single document by identifier.
    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>>;

    /// Creates a document.
    async fn create(&self, collection: &str, id: &DocumentId, data: Value) -> Result<()>;

    /// Updates an existing document by merging top-level fields.
    async fn update(&self, collection: &str, id: &DocumentId, data: Value) -> Result<()>;

    /// Deletes a document.
    async fn delete(
        &self,
        collection: &str,
        id: &DocumentId,
        precondition: Precondition,
    ) -> Result<()>;

    /// Atomically applies a batch of writes.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// Handle to a named collection in a shared store.
#[derive(Clone)]
pub struct CollectionRef {
    store: Arc<dyn DocumentStore>,
    name: Arc<str>,
}

impl CollectionRef {
    /// Creates a handle to `name` in `store`.
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            name: name.into(),
        }
    }

    /// Returns the collection name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the backing store.
    #[inline]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Starts a query scoped to this collection.
    pub fn query(&self) -> Query {
        Query::new(self.name.as_ref())
    }

    /// Starts a query scoped to this collection, limited to `n` rows.
    pub fn limit(&self, n: usize) -> Query {
        self.query().limit(n)
    }

    /// Executes a query.
    pub async fn run(&self, query: &Query) -> Result<Vec<Document>> {
        self.store.run_query(query).await
    }

    /// Fetches a document by identifier.
    pub async fn get(&self, id: &DocumentId) -> Result<Option<Document>> {
        self.store.get(&self.name, id).await
    }

    /// Creates a document.
    pub async fn create(&self, id: &DocumentId, data: Value) -> Result<()> {
        self.store.create(&self.name, id, data).await
    }

    /// Updates a document.
    pub async fn update(&self, id: &DocumentId, data: Value) -> Result<()> {
        self.store.update(&self.name, id, data).await
    }

    /// Deletes a document.
    pub async fn delete(&self, id: &DocumentId, precondition: Precondition) -> Result<()> {
        self.store.delete(&self.name, id, precondition).await
    }
}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRef")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
