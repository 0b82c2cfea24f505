//! Adaptive pacing between platform calls
//!
//! The controller keeps a current inter-item delay. Explicit rate-limit
//! signals push it up by two steps and dictate an exact wait; every
//! successful send pulls it down by one step. Independently of the delay,
//! a longer pause is taken after every `burst_size` completed items.
//!
//! ```text
//! initial 1.0s, step 0.5s, min 0.5s, max 10.0s
//! success        -> 0.5s
//! retry after 5  -> wait 6s, delay 1.5s
//! success        -> 1.0s
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pacing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Delay between items when a run starts
    ///
    /// Default: 1.0 seconds
    #[serde(default = "defaults::initial_delay_secs")]
    pub initial_delay_secs: f64,

    /// Default: 0.5 seconds
    #[serde(default = "defaults::min_delay_secs")]
    pub min_delay_secs: f64,

    /// Default: 10.0 seconds
    #[serde(default = "defaults::max_delay_secs")]
    pub max_delay_secs: f64,

    /// One unit of adjustment
    ///
    /// Default: 0.5 seconds
    #[serde(default = "defaults::step_secs")]
    pub step_secs: f64,

    /// Completed items between two burst pauses, `0` to disable
    ///
    /// Default: 20
    #[serde(default = "defaults::burst_size")]
    pub burst_size: u32,

    /// Default: 30 seconds
    #[serde(default = "defaults::burst_pause_secs")]
    pub burst_pause_secs: u64,

    /// Added on top of every wait the platform asks for
    ///
    /// Default: 1 second
    #[serde(default = "defaults::safety_margin_secs")]
    pub safety_margin_secs: u64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: defaults::initial_delay_secs(),
            min_delay_secs: defaults::min_delay_secs(),
            max_delay_secs: defaults::max_delay_secs(),
            step_secs: defaults::step_secs(),
            burst_size: defaults::burst_size(),
            burst_pause_secs: defaults::burst_pause_secs(),
            safety_margin_secs: defaults::safety_margin_secs(),
        }
    }
}

mod defaults {
    pub const fn initial_delay_secs() -> f64 {
        1.0
    }

    pub const fn min_delay_secs() -> f64 {
        0.5
    }

    pub const fn max_delay_secs() -> f64 {
        10.0
    }

    pub const fn step_secs() -> f64 {
        0.5
    }

    pub const fn burst_size() -> u32 {
        20
    }

    pub const fn burst_pause_secs() -> u64 {
        30
    }

    pub const fn safety_margin_secs() -> u64 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateState {
    pub current_delay_secs: f64,
    pub consecutive_successes: u32,
    pub consecutive_rate_limits: u32,
}

/// Owns the [`RateState`] of one run
#[derive(Debug, Clone)]
pub struct RateController {
    config: RateConfig,
    state: RateState,
    since_pause: u32,
}

impl RateController {
    #[must_use]
    pub fn new(config: RateConfig) -> Self {
        let current_delay_secs = config
            .initial_delay_secs
            .clamp(config.min_delay_secs, config.max_delay_secs.max(config.min_delay_secs));

        Self {
            config,
            state: RateState {
                current_delay_secs,
                consecutive_successes: 0,
                consecutive_rate_limits: 0,
            },
            since_pause: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &RateState {
        &self.state
    }

    /// Delay to sleep between two consecutive items
    #[must_use]
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_secs_f64(self.state.current_delay_secs.max(0.0))
    }

    /// A call went through
    pub fn on_success(&mut self) {
        self.state.consecutive_successes = self.state.consecutive_successes.saturating_add(1);
        self.state.consecutive_rate_limits = 0;
        self.state.current_delay_secs =
            (self.state.current_delay_secs - self.config.step_secs).max(self.config.min_delay_secs);
    }

    /// The platform asked for `retry_after` seconds of quiet
    ///
    /// Returns the wait before the same item may be tried again: the requested
    /// time (at least one second) plus the safety margin.
    pub fn on_rate_limited(&mut self, retry_after: i64) -> Duration {
        self.state.consecutive_rate_limits = self.state.consecutive_rate_limits.saturating_add(1);
        self.state.consecutive_successes = 0;
        self.state.current_delay_secs = (self.state.current_delay_secs
            + 2.0 * self.config.step_secs)
            .min(self.config.max_delay_secs);

        let requested = u64::try_from(retry_after.max(1)).unwrap_or(1);
        Duration::from_secs(requested.saturating_add(self.config.safety_margin_secs))
    }

    /// Count one completed item; returns the burst pause when one is due
    pub fn record_completion(&mut self) -> Option<Duration> {
        if self.config.burst_size == 0 {
            return None;
        }

        self.since_pause += 1;
        if self.since_pause >= self.config.burst_size {
            self.since_pause = 0;
            return Some(Duration::from_secs(self.config.burst_pause_secs));
        }

        None
    }
}
