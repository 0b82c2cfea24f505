//! Checkpoint store implementations
//!
//! - `file`: one file per list on local disk, for real runs
//! - `memory`: a map behind a lock, for dry runs and tests
//! - `test`: memory store with save notifications and failure injection

pub mod file;
pub mod memory;

pub use file::{FileCheckpointStore, FileCheckpointStoreBuilder};
pub use memory::MemoryCheckpointStore;
pub use test::TestCheckpointStore;
