//! Mock unit of work for testing.

use std::sync::{Mutex, MutexGuard, PoisonError};

use docrepo::{Error, Result, UnitOfWork, WriteBatch, WriteOp};

#[derive(Debug, Default)]
struct State {
    pending: WriteBatch,
    committed: Vec<WriteBatch>,
    begins: usize,
    rollbacks: usize,
    fail_next_commit: bool,
}

/// Unit of work that records batches instead of applying them.
///
/// Every write a repository queues lands in the pending batch; `commit` moves
/// it to the committed list without touching any store.
#[derive(Debug, Default)]
pub struct MockUnitOfWork {
    state: Mutex<State>,
}

impl MockUnitOfWork {
    /// Creates a new mock unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail with a backend error and discard the batch.
    pub fn fail_next_commit(&self) {
        self.lock().fail_next_commit = true;
    }

    /// Returns the operations queued since the last commit or rollback.
    pub fn pending(&self) -> Vec<WriteOp> {
        self.lock().pending.ops().to_vec()
    }

    /// Returns every successfully committed batch, oldest first.
    pub fn committed(&self) -> Vec<WriteBatch> {
        self.lock().committed.clone()
    }

    /// Returns how many times `begin` was called.
    pub fn begin_count(&self) -> usize {
        self.lock().begins
    }

    /// Returns how many times `rollback` was called.
    pub fn rollback_count(&self) -> usize {
        self.lock().rollbacks
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl UnitOfWork for MockUnitOfWork {
    async fn begin(&self) -> Result<()> {
        self.lock().begins += 1;
        Ok(())
    }

    async fn transaction(&self) -> Result<WriteBatch> {
        Ok(self.lock().pending.clone())
    }

    async fn enqueue(&self, op: WriteOp) -> Result<()> {
        self.lock().pending.push(op);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut state = self.lock();
        let batch = std::mem::take(&mut state.pending);
        if std::mem::take(&mut state.fail_next_commit) {
            return Err(Error::backend("mock commit failure"));
        }

        state.committed.push(batch);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut state = self.lock();
        state.pending = WriteBatch::new();
        state.rollbacks += 1;
        Ok(())
    }
}
