use crate::types::{BlockCheckpoint, PaymentNotification};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// Durable sink for scan progress.
///
/// `commit_block` must be atomic: the checkpoint and the notifications of a
/// master block land together or not at all. The scanner relies on that to
/// keep redelivery of an entire block the worst failure mode after a crash.
#[async_trait]
pub trait CheckpointStore: Send + Sync + 'static {
    /// Checkpoint of the last fully committed master block, if any.
    async fn last_checkpoint(&self) -> Result<Option<BlockCheckpoint>>;

    /// Atomically records one processed master block together with the
    /// notifications decoded out of it.
    async fn commit_block(
        &self,
        checkpoint: BlockCheckpoint,
        notifications: Vec<PaymentNotification>,
    ) -> Result<()>;
}

/// In-memory [`CheckpointStore`] for tests and demos.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    checkpoint: Option<BlockCheckpoint>,
    notifications: Vec<PaymentNotification>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed checkpoint.
    pub fn checkpoint(&self) -> Option<BlockCheckpoint> {
        self.inner.lock().unwrap().checkpoint
    }

    /// Every committed notification, in commit order.
    pub fn notifications(&self) -> Vec<PaymentNotification> {
        self.inner.lock().unwrap().notifications.clone()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn last_checkpoint(&self) -> Result<Option<BlockCheckpoint>> {
        Ok(self.inner.lock().unwrap().checkpoint)
    }

    async fn commit_block(
        &self,
        checkpoint: BlockCheckpoint,
        mut notifications: Vec<PaymentNotification>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.checkpoint = Some(checkpoint);
        inner.notifications.append(&mut notifications);
        Ok(())
    }
}
