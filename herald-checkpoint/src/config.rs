use std::{path::PathBuf, sync::Arc};

use serde::Deserialize;

use crate::{
    backends::{FileCheckpointStore, MemoryCheckpointStore},
    r#trait::CheckpointStore,
};

mod defaults {
    use std::path::PathBuf;

    pub fn path() -> PathBuf {
        PathBuf::from(".herald/checkpoints")
    }
}

/// Where checkpoints are kept
///
/// File-backed (the default):
/// ```ron
/// Herald (
///     checkpoint: File(
///         path: "/var/lib/herald/checkpoints",
///     ),
/// )
/// ```
///
/// In memory, so every run starts from the beginning:
/// ```ron
/// Herald (
///     checkpoint: Memory,
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
pub enum CheckpointConfig {
    File {
        #[serde(default = "defaults::path")]
        path: PathBuf,
    },
    Memory,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self::File {
            path: defaults::path(),
        }
    }
}

impl CheckpointConfig {
    /// The checkpoint directory for file-backed stores
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File { path } => Some(path),
            Self::Memory => None,
        }
    }

    /// Build the configured store, creating its directory if needed
    ///
    /// # Errors
    /// - If the configured path is not an acceptable checkpoint directory
    /// - If a file-backed store cannot be initialised
    pub async fn into_store(self) -> crate::Result<Arc<dyn CheckpointStore>> {
        match self {
            Self::File { path } => {
                let store = FileCheckpointStore::builder().path(path).build()?;
                store.init().await?;
                Ok(Arc::new(store))
            }
            Self::Memory => Ok(Arc::new(MemoryCheckpointStore::new())),
        }
    }
}
