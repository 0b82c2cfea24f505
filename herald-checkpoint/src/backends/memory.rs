use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::{
    r#trait::CheckpointStore,
    types::{Checkpoint, ListKey},
};

/// In-memory checkpoint store
///
/// Nothing survives the process. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    pub(crate) checkpoints: Arc<RwLock<HashMap<ListKey, Checkpoint>>>,
}

impl MemoryCheckpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a checkpoint, bypassing merge
    pub fn insert(&self, key: ListKey, checkpoint: Checkpoint) {
        self.checkpoints
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key, checkpoint);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checkpoints
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, key: &ListKey) -> Checkpoint {
        self.checkpoints
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    async fn save(&self, key: &ListKey, checkpoint: &Checkpoint) -> crate::Result<()> {
        let mut checkpoints = self.checkpoints.write()?;
        let mut merged = checkpoint.clone();
        if let Some(stored) = checkpoints.get(key) {
            merged.merge(stored);
        }
        checkpoints.insert(key.clone(), merged);
        Ok(())
    }

    async fn clear(&self, key: &ListKey) -> crate::Result<()> {
        self.checkpoints.write()?.remove(key);
        Ok(())
    }
}
