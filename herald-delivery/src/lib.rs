//! Resilient batch dispatch
//!
//! This crate turns an ordered [`herald_common::ItemList`] into a sequence of
//! platform calls:
//! - classify every failure ([`DeliveryError`])
//! - adapt pacing to rate-limit feedback ([`policy::RateController`])
//! - re-create content that cannot be copied ([`engine`] fallbacks)
//! - persist progress after every item ([`herald_checkpoint`])
//! - report to the operator on a side channel ([`Reporter`])

pub mod engine;
mod error;
pub mod platform;
pub mod policy;
mod processor;
mod report;
mod types;

pub use engine::{DeliveryEngine, EngineConfig};
pub use error::{
    DeliveryError, DispatchError, FatalError, PermanentError, TextField, TransientError,
};
pub use platform::{Media, MediaKind, Platform, PlatformError, PollRequest, Resend, SourceContent};
pub use policy::{RateConfig, RateController, RateState, RetryPolicy};
pub use processor::{DispatchConfig, DispatchProcessor};
pub use report::{FanoutReporter, ProgressEvent, RecordingReporter, Reporter, TracingReporter};
pub use types::{DeliveryOutcome, RunStatus, RunSummary};
