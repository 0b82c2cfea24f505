//! Operator progress reporting
//!
//! Reporting is a side channel. [`Reporter::report`] has nothing to return,
//! so a broken reporter can never fail or stall a run for longer than its
//! own timeout.

use core::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herald_common::internal;

use crate::types::RunSummary;

/// Something worth telling the operator about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started {
        label: String,
        total: u64,
        resume_from: u64,
    },
    Progress {
        summary: RunSummary,
        last_index: u64,
    },
    RateLimited {
        index: u64,
        wait_secs: u64,
    },
    ItemFailed {
        index: u64,
        kind: &'static str,
        reason: String,
    },
    ValidationFailed {
        label: String,
        index: Option<u64>,
        reason: String,
    },
    Halted {
        index: u64,
        kind: &'static str,
        reason: String,
        summary: RunSummary,
    },
    Interrupted {
        next_index: u64,
        summary: RunSummary,
    },
    Completed {
        summary: RunSummary,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                label,
                total,
                resume_from,
            } => write!(
                f,
                "🚀 Starting {label}: {total} items, resuming at #{resume_from}"
            ),
            Self::Progress {
                summary,
                last_index,
            } => write!(
                f,
                "✅ Progress: {} sent, {} skipped, {} failed. Last item: #{last_index}",
                summary.sent, summary.skipped, summary.failed
            ),
            Self::RateLimited { index, wait_secs } => {
                write!(f, "⏳ Rate limited: sleeping {wait_secs}s at item #{index}")
            }
            Self::ItemFailed {
                index,
                kind,
                reason,
            } => write!(f, "⚠️ Gave up on {kind} item #{index}: {reason}"),
            Self::ValidationFailed {
                label,
                index: Some(index),
                reason,
            } => write!(f, "❌ {label} rejected at item #{index}: {reason}"),
            Self::ValidationFailed {
                label,
                index: None,
                reason,
            } => write!(f, "❌ {label} rejected: {reason}"),
            Self::Halted {
                index,
                kind,
                reason,
                summary,
            } => write!(f, "💥 Halted at {kind} item #{index}: {reason}\n{summary}"),
            Self::Interrupted {
                next_index,
                summary,
            } => write!(f, "🛑 Interrupted, next item is #{next_index}\n{summary}"),
            Self::Completed { summary } => {
                write!(f, "🎉 {} complete\n{summary}", summary.label)
            }
        }
    }
}

/// Fire-and-forget sink for progress events
#[async_trait]
pub trait Reporter: Send + Sync + fmt::Debug {
    async fn report(&self, event: &ProgressEvent);
}

/// Reports into the process log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

#[async_trait]
impl Reporter for TracingReporter {
    async fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::ValidationFailed { .. } | ProgressEvent::Halted { .. } => {
                internal!(level = ERROR, "{event}");
            }
            ProgressEvent::ItemFailed { .. } | ProgressEvent::Interrupted { .. } => {
                internal!(level = WARN, "{event}");
            }
            _ => internal!(level = INFO, "{event}"),
        }
    }
}

/// Keeps every event, for assertions in tests
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn report(&self, event: &ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Sends every event to all inner reporters in turn
#[derive(Debug, Default)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl FanoutReporter {
    #[must_use]
    pub fn new(reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self { reporters }
    }
}

#[async_trait]
impl Reporter for FanoutReporter {
    async fn report(&self, event: &ProgressEvent) {
        for reporter in &self.reporters {
            reporter.report(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        let event = ProgressEvent::RateLimited {
            index: 12,
            wait_secs: 6,
        };
        assert_eq!(event.to_string(), "⏳ Rate limited: sleeping 6s at item #12");
    }

    #[test]
    fn test_completed_display() {
        let mut summary = RunSummary::new("polls.json", 3, 0);
        summary.sent = 2;
        summary.skipped = 1;

        let text = ProgressEvent::Completed { summary }.to_string();
        assert!(text.starts_with("🎉 polls.json complete\n"));
        assert!(text.contains("Sent: 2\nSkipped: 1\nFailed: 0"));
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_reporter() {
        let first = RecordingReporter::new();
        let second = RecordingReporter::new();
        let fanout = FanoutReporter::new(vec![Arc::new(first.clone()), Arc::new(second.clone())]);

        fanout
            .report(&ProgressEvent::RateLimited {
                index: 0,
                wait_secs: 2,
            })
            .await;

        assert_eq!(first.events().len(), 1);
        assert_eq!(second.events().len(), 1);
    }
}
