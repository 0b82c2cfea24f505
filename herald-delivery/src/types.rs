use core::fmt;

use serde::Serialize;

/// Result of one delivery attempt for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// Permanently impossible; the item is done without a delivery
    Skipped { reason: String },
    /// This attempt failed in a retryable way
    Failed { reason: String },
    /// The platform asked for a pause before trying again
    RateLimited { retry_after_secs: i64 },
    /// The run cannot continue
    Fatal { reason: String },
}

impl DeliveryOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every item reached a terminal outcome
    Completed,
    /// A fatal error stopped the run; the checkpoint points before `index`
    Halted {
        index: u64,
        kind: &'static str,
        reason: String,
    },
    /// A shutdown signal stopped the run at a suspension point
    Interrupted,
}

/// Counts collected over one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub label: String,
    pub total: u64,
    /// Index the run started at after reading the checkpoint
    pub resumed_from: u64,
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
    pub rate_limit_waits: u64,
    pub retries: u64,
    pub burst_pauses: u64,
    pub status: RunStatus,
}

impl RunSummary {
    #[must_use]
    pub fn new(label: impl Into<String>, total: u64, resumed_from: u64) -> Self {
        Self {
            label: label.into(),
            total,
            resumed_from,
            sent: 0,
            skipped: 0,
            failed: 0,
            rate_limit_waits: 0,
            retries: 0,
            burst_pauses: 0,
            status: RunStatus::Completed,
        }
    }

    /// Items that reached a terminal outcome during this run
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.sent + self.skipped + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sent: {}\nSkipped: {}\nFailed: {}\nRate-limit waits: {}\nRetries: {}",
            self.sent, self.skipped, self.failed, self.rate_limit_waits, self.retries
        )
    }
}
