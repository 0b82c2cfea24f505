pub mod controller;
pub mod source;

pub use controller::{Herald, SHUTDOWN_BROADCAST, exit_code, find_config_file};
pub use source::{Source, SourceError};
