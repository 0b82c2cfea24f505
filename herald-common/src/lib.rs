pub mod chat;
pub mod error;
pub mod item;
pub mod limits;
pub mod logging;

pub use chat::ChatRef;
pub use error::ValidationError;
pub use item::{
    DeleteEntry, ForwardEntry, ItemKind, ItemList, MessageItem, PollItem, WorkItem,
};
pub use limits::PlatformLimits;
pub use tracing;

/// Signals broadcast to long-running tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}
