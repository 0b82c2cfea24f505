//! Dispatch loop orchestration

mod run;

use std::sync::Arc;

use herald_checkpoint::CheckpointStore;
use herald_common::internal;
use serde::Deserialize;

use crate::{
    engine::DeliveryEngine,
    policy::{RateConfig, RetryPolicy},
    report::Reporter,
};

mod defaults {
    pub const fn report_every() -> u64 {
        500
    }
}

/// Loop configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub rate: RateConfig,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Emit a progress event every this many completed items, `0` to disable
    ///
    /// Default: 500
    #[serde(default = "defaults::report_every")]
    pub report_every: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            rate: RateConfig::default(),
            retry: RetryPolicy::default(),
            report_every: defaults::report_every(),
        }
    }
}

/// Drives one item list to completion
///
/// Items are delivered strictly one at a time in index order. Progress is
/// saved after every item that reaches a terminal outcome, before the next
/// item is started, so a restarted run picks up right after the last
/// completed item.
#[derive(Debug)]
pub struct DispatchProcessor {
    config: DispatchConfig,
    engine: DeliveryEngine,
    store: Arc<dyn CheckpointStore>,
    reporter: Arc<dyn Reporter>,
}

impl DispatchProcessor {
    #[must_use]
    pub fn new(
        config: DispatchConfig,
        engine: DeliveryEngine,
        store: Arc<dyn CheckpointStore>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        internal!(
            "Dispatch processor ready: burst {} / {}s pause, {} attempts",
            config.rate.burst_size,
            config.rate.burst_pause_secs,
            config.retry.max_attempts
        );

        Self {
            config,
            engine,
            store,
            reporter,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }
}
