//! Call-recording doubles for repository collaborators.
//!
//! These doubles wrap or stand in for the mapper and unit of work used by
//! docrepo repositories, recording every call so tests can assert on how a
//! repository drove its collaborators.

mod mapper;
mod unit_of_work;

use std::sync::Arc;

use docrepo::{Document, DocumentStore, MemoryStore, Result, WriteBatch, WriteOp};
pub use mapper::MockMapper;
pub use unit_of_work::MockUnitOfWork;

/// Creates an in-memory store with `documents` inserted into `collection`.
///
/// The documents are committed as one batch, so duplicate identifiers fail
/// the whole seed.
pub async fn seeded_store(
    collection: &str,
    documents: impl IntoIterator<Item = Document>,
) -> Result<Arc<MemoryStore>> {
    let store = MemoryStore::new();
    let batch: WriteBatch = documents
        .into_iter()
        .map(|document| WriteOp::create(collection, document.id, document.data))
        .collect();

    store.commit(batch).await?;
    Ok(Arc::new(store))
}
