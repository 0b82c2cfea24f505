use async_trait::async_trait;

use crate::types::{Checkpoint, ListKey};

/// Durable storage for checkpoints
///
/// There is exactly one writer per list: the dispatch loop of the single
/// active run. Implementations must make `save` atomic with respect to a
/// process crash and must never let a later `load` observe less progress than
/// a completed `save`.
#[async_trait]
pub trait CheckpointStore: Send + Sync + std::fmt::Debug {
    /// Read the checkpoint for `key`
    ///
    /// A missing, unreadable or corrupt checkpoint yields the default
    /// checkpoint: the run starts over rather than failing.
    async fn load(&self, key: &ListKey) -> Checkpoint;

    /// Persist the checkpoint for `key`, merging with anything already stored
    ///
    /// # Errors
    /// If the checkpoint cannot be written durably
    async fn save(&self, key: &ListKey, checkpoint: &Checkpoint) -> crate::Result<()>;

    /// Forget the checkpoint for `key`
    ///
    /// # Errors
    /// If an existing checkpoint cannot be removed
    async fn clear(&self, key: &ListKey) -> crate::Result<()>;
}
