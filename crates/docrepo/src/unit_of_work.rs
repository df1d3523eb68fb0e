//! Unit of work: pending writes committed or discarded as one atomic group.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::store::{DocumentStore, WriteBatch, WriteOp};
use crate::{Error, Result, TRACING_TARGET_UNIT_OF_WORK};

/// Accumulator of pending writes.
///
/// A unit of work is meant for one logical caller at a time. Operations are
/// committed in the order they were enqueued.
#[async_trait::async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Opens a new batch. Calling this while a batch is active is a no-op.
    async fn begin(&self) -> Result<()>;

    /// Returns a snapshot of the pending batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionNotActive`] if no batch is open.
    async fn transaction(&self) -> Result<WriteBatch>;

    /// Queues a write into the pending batch.
    async fn enqueue(&self, op: WriteOp) -> Result<()>;

    /// Atomically applies every pending write.
    ///
    /// If the store rejects any operation, none of them take effect.
    async fn commit(&self) -> Result<()>;

    /// Discards pending writes and opens a fresh empty batch.
    ///
    /// Already committed batches are not affected.
    async fn rollback(&self) -> Result<()>;
}

/// Lifecycle of the batch held by a [`StoreUnitOfWork`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BatchState {
    /// No batch is open; writes are rejected until [`UnitOfWork::begin`].
    #[default]
    Empty,
    /// A batch is open and accumulating writes.
    Active(WriteBatch),
}

impl BatchState {
    /// Returns true if a batch is open.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// Unit of work that commits its batch to a [`DocumentStore`].
///
/// The instance starts with an open batch. After a commit, call
/// [`UnitOfWork::begin`] before queueing more writes.
pub struct StoreUnitOfWork {
    store: Arc<dyn DocumentStore>,
    state: Mutex<BatchState>,
}

impl StoreUnitOfWork {
    /// Creates a unit of work with an open batch.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            state: Mutex::new(BatchState::Active(WriteBatch::new())),
        }
    }

    /// Returns a copy of the current lifecycle state.
    pub async fn state(&self) -> BatchState {
        self.state.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl UnitOfWork for StoreUnitOfWork {
    async fn begin(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.is_active() {
            *state = BatchState::Active(WriteBatch::new());
            tracing::debug!(target: TRACING_TARGET_UNIT_OF_WORK, "Batch opened");
        }
        Ok(())
    }

    async fn transaction(&self) -> Result<WriteBatch> {
        match &*self.state.lock().await {
            BatchState::Active(batch) => Ok(batch.clone()),
            BatchState::Empty => Err(Error::TransactionNotActive),
        }
    }

    async fn enqueue(&self, op: WriteOp) -> Result<()> {
        let mut state = self.state.lock().await;
        let BatchState::Active(batch) = &mut *state else {
            return Err(Error::TransactionNotActive);
        };

        tracing::trace!(
            target: TRACING_TARGET_UNIT_OF_WORK,
            kind = op.kind(),
            collection = op.collection(),
            id = %op.id(),
            "Write queued"
        );
        batch.push(op);
        Ok(())
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_UNIT_OF_WORK)]
    async fn commit(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let BatchState::Active(batch) = std::mem::take(&mut *state) else {
            return Err(Error::TransactionNotActive);
        };

        let ops = batch.len();
        if batch.is_empty() {
            tracing::debug!(target: TRACING_TARGET_UNIT_OF_WORK, "Empty batch committed");
            return Ok(());
        }

        self.store.commit(batch).await?;
        tracing::debug!(target: TRACING_TARGET_UNIT_OF_WORK, ops, "Batch committed");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let discarded = match &*state {
            BatchState::Active(batch) => batch.len(),
            BatchState::Empty => 0,
        };
        *state = BatchState::Active(WriteBatch::new());
        tracing::debug!(target: TRACING_TARGET_UNIT_OF_WORK, discarded, "Batch rolled back");
        Ok(())
    }
}

impl fmt::Debug for StoreUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreUnitOfWork").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::{MemoryStore, Precondition};
    use crate::types::DocumentId;

    fn setup() -> (MemoryStore, StoreUnitOfWork) {
        let store = MemoryStore::new();
        let uow = StoreUnitOfWork::new(Arc::new(store.clone()));
        (store, uow)
    }

    #[tokio::test]
    async fn commit_applies_ops_in_order() {
        let (store, uow) = setup();
        let id = DocumentId::from(1_u64);

        uow.enqueue(WriteOp::create("users", id.clone(), json!({ "name": "a" })))
            .await
            .unwrap();
        uow.enqueue(WriteOp::update("users", id.clone(), json!({ "name": "b" })))
            .await
            .unwrap();
        assert_eq!(store.count("users").await, 0);

        uow.commit().await.unwrap();
        let stored = store.get("users", &id).await.unwrap().unwrap();
        assert_eq!(stored.data["name"], "b");
        assert_eq!(uow.state().await, BatchState::Empty);
    }

    #[tokio::test]
    async fn rejected_commit_applies_nothing() {
        let (store, uow) = setup();
        store
            .create("users", &DocumentId::from(2_u64), json!({ "name": "x" }))
            .await
            .unwrap();

        uow.enqueue(WriteOp::create("users", DocumentId::from(1_u64), json!({})))
            .await
            .unwrap();
        uow.enqueue(WriteOp::create("users", DocumentId::from(2_u64), json!({})))
            .await
            .unwrap();

        let err = uow.commit().await.unwrap_err();
        assert!(err.is_precondition_failure());
        assert_eq!(store.count("users").await, 1);
        assert_eq!(uow.state().await, BatchState::Empty);
    }

    #[tokio::test]
    async fn rollback_discards_pending_ops() {
        let (store, uow) = setup();
        uow.enqueue(WriteOp::create("users", DocumentId::from(1_u64), json!({})))
            .await
            .unwrap();

        uow.rollback().await.unwrap();
        assert!(uow.transaction().await.unwrap().is_empty());

        uow.commit().await.unwrap();
        assert_eq!(store.count("users").await, 0);
    }

    #[tokio::test]
    async fn enqueue_after_commit_requires_begin() {
        let (store, uow) = setup();
        uow.commit().await.unwrap();

        let op = WriteOp::delete("users", DocumentId::from(1_u64), Precondition::None);
        assert!(matches!(
            uow.enqueue(op.clone()).await,
            Err(Error::TransactionNotActive)
        ));
        assert!(matches!(uow.commit().await, Err(Error::TransactionNotActive)));
        assert!(matches!(
            uow.transaction().await,
            Err(Error::TransactionNotActive)
        ));

        uow.begin().await.unwrap();
        uow.enqueue(op).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(store.count("users").await, 0);
    }

    #[tokio::test]
    async fn begin_keeps_active_batch() {
        let (_, uow) = setup();
        uow.enqueue(WriteOp::create("users", DocumentId::from(1_u64), json!({})))
            .await
            .unwrap();

        uow.begin().await.unwrap();
        assert_eq!(uow.transaction().await.unwrap().len(), 1);
    }
}
