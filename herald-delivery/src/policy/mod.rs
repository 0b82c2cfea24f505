//! Pacing and retry decisions, kept apart from the loop that applies them

pub mod rate;
pub mod retry;

pub use rate::{RateConfig, RateController, RateState};
pub use retry::RetryPolicy;
