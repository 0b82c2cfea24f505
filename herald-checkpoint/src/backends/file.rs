use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bincode::config;
use herald_common::internal;
use tokio::{fs, io::AsyncWriteExt};

use crate::{
    Result,
    error::{SerializationError, ValidationError},
    r#trait::CheckpointStore,
    types::{Checkpoint, ListKey},
};

const EXTENSION: &str = "ckpt";
const TEMP_PREFIX: &str = ".tmp_";

const SENSITIVE_PREFIXES: [&str; 9] = [
    "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev",
];

/// File-based checkpoint store
///
/// Every list gets one file, `{key}.ckpt`, holding a bincode encoded
/// [`Checkpoint`].
///
/// # Atomicity
/// A save writes `.tmp_{key}.ckpt`, syncs it to disk and renames it over the
/// real file. A crash at any point leaves either the previous checkpoint or
/// the new one, never a torn record. Leftover temporary files are removed by
/// [`FileCheckpointStore::init`].
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl Default for FileCheckpointStore {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".herald/checkpoints"),
        }
    }
}

impl FileCheckpointStore {
    /// Reject directories a checkpoint has no business living in
    ///
    /// Relative paths are allowed so the default lives next to the working
    /// directory, but `..` components and system directories are not.
    pub(crate) fn validate_path(path: &Path) -> std::result::Result<(), ValidationError> {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(ValidationError::ParentDir(path.display().to_string()));
        }

        for prefix in SENSITIVE_PREFIXES {
            if path.starts_with(prefix) {
                return Err(ValidationError::SystemDirectory {
                    prefix: prefix.to_string(),
                    path: path.display().to_string(),
                });
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn builder() -> FileCheckpointStoreBuilder {
        FileCheckpointStoreBuilder::default()
    }

    /// The directory holding checkpoint files
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the checkpoint directory and remove torn temporary files
    ///
    /// # Errors
    /// - If the directory cannot be created
    /// - If the path exists but is not a directory
    pub async fn init(&self) -> Result<()> {
        internal!("Initialising checkpoint store at {}", self.path.display());

        if !fs::try_exists(&self.path).await? {
            internal!("{} does not exist, creating...", self.path.display());
            fs::create_dir_all(&self.path).await?;
        } else if !fs::metadata(&self.path).await?.is_dir() {
            return Err(ValidationError::NotDirectory(self.path.display().to_string()).into());
        }

        self.cleanup_temporary_files().await
    }

    async fn cleanup_temporary_files(&self) -> Result<()> {
        let mut entries = fs::read_dir(&self.path).await?;
        let mut cleaned = 0;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
                fs::remove_file(entry.path()).await?;
                cleaned += 1;
            }
        }

        if cleaned > 0 {
            internal!(
                level = INFO,
                "Cleaned up {cleaned} interrupted checkpoint writes"
            );
        }

        Ok(())
    }

    fn file_for(&self, key: &ListKey) -> PathBuf {
        self.path.join(format!("{key}.{EXTENSION}"))
    }

    /// Read and decode the stored checkpoint, `None` if there is none
    async fn read(&self, key: &ListKey) -> Result<Option<Checkpoint>> {
        let path = self.file_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let (checkpoint, consumed): (Checkpoint, usize) =
            bincode::serde::decode_from_slice(&bytes, config::standard())
                .map_err(SerializationError::from)?;

        if consumed != bytes.len() {
            return Err(SerializationError::Corrupted(format!(
                "{} has {} trailing bytes",
                path.display(),
                bytes.len() - consumed
            ))
            .into());
        }

        Ok(Some(checkpoint))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    #[tracing::instrument(level = tracing::Level::DEBUG, skip(self), fields(key = %key))]
    async fn load(&self, key: &ListKey) -> Checkpoint {
        match self.read(key).await {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => Checkpoint::default(),
            Err(err) => {
                internal!(
                    level = WARN,
                    "Unable to read checkpoint for {key}, starting from the beginning: {err}"
                );
                Checkpoint::default()
            }
        }
    }

    #[tracing::instrument(level = tracing::Level::DEBUG, skip(self, checkpoint), fields(key = %key))]
    async fn save(&self, key: &ListKey, checkpoint: &Checkpoint) -> Result<()> {
        let mut merged = checkpoint.clone();
        if let Ok(Some(stored)) = self.read(key).await {
            merged.merge(&stored);
        }

        let encoded = bincode::serde::encode_to_vec(&merged, config::standard())
            .map_err(SerializationError::from)?;

        let path = self.file_for(key);
        let temp = self.path.join(format!("{TEMP_PREFIX}{key}.{EXTENSION}"));

        let mut file = fs::File::create(&temp).await?;
        file.write_all(&encoded).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp, &path).await?;
        sync_dir(&self.path).await?;

        internal!(
            level = DEBUG,
            "Checkpoint for {key} at {}",
            merged.last_completed_index()
        );

        Ok(())
    }

    async fn clear(&self, key: &ListKey) -> Result<()> {
        match fs::remove_file(self.file_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FileCheckpointStoreBuilder {
    path: PathBuf,
}

impl FileCheckpointStoreBuilder {
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// # Errors
    /// If the path fails validation
    pub fn build(self) -> Result<FileCheckpointStore> {
        FileCheckpointStore::validate_path(&self.path)?;
        Ok(FileCheckpointStore { path: self.path })
    }
}

/// Flush directory entries so a completed rename survives power loss
async fn sync_dir(path: &Path) -> std::io::Result<()> {
    fs::File::open(path).await?.sync_all().await
}
