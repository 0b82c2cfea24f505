//! Resume checkpoints for dispatch runs
//!
//! A checkpoint records the highest item index that reached a terminal
//! outcome for one item list. It is read once when a run starts and written
//! after every item, so a restarted run continues right after the last
//! completed item.

pub mod backends;
pub mod config;
pub mod error;
pub mod r#trait;
pub mod types;

pub use backends::{FileCheckpointStore, MemoryCheckpointStore, TestCheckpointStore};
pub use config::CheckpointConfig;
pub use error::{CheckpointError, Result, SerializationError, ValidationError};
pub use r#trait::CheckpointStore;
pub use types::{Checkpoint, ListKey};
