//! The per-item state machine and the loop around it

use std::time::Duration;

use herald_checkpoint::ListKey;
use herald_common::{ItemList, Signal, WorkItem, internal};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use super::DispatchProcessor;
use crate::{
    error::{DispatchError, FatalError},
    policy::RateController,
    report::ProgressEvent,
    types::{DeliveryOutcome, RunStatus, RunSummary},
};

/// Where one item stands
#[derive(Debug)]
enum ItemState {
    Attempting {
        attempt: u32,
    },
    RetryWait {
        attempt: u32,
        wait: Duration,
        cause: RetryCause,
    },
    Done(Terminal),
}

#[derive(Debug)]
enum RetryCause {
    /// Does not use up an attempt
    RateLimited,
    Failed(String),
}

/// Final outcome of one item
#[derive(Debug)]
enum Terminal {
    Sent,
    Skipped(String),
    Failed(String),
    Fatal(String),
}

enum Step {
    Done(Terminal),
    Interrupted,
}

/// The shutdown side of every suspension point
///
/// A closed channel means nobody can ask for a shutdown any more, so sleeps
/// simply run to completion from then on.
struct Shutdown {
    receiver: broadcast::Receiver<Signal>,
    open: bool,
}

impl Shutdown {
    const fn new(receiver: broadcast::Receiver<Signal>) -> Self {
        Self {
            receiver,
            open: true,
        }
    }

    /// Whether a shutdown was signalled since the last check
    fn requested(&mut self) -> bool {
        if !self.open {
            return false;
        }

        match self.receiver.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => true,
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                self.open = false;
                false
            }
        }
    }

    /// Sleep for `duration`; returns `true` if a shutdown cut it short
    async fn sleep(&mut self, duration: Duration) -> bool {
        let mut sleep = std::pin::pin!(tokio::time::sleep(duration));

        loop {
            tokio::select! {
                () = sleep.as_mut() => return false,
                signal = self.receiver.recv(), if self.open => match signal {
                    Ok(_) | Err(RecvError::Lagged(_)) => return true,
                    Err(RecvError::Closed) => self.open = false,
                },
            }
        }
    }
}

impl DispatchProcessor {
    /// Deliver every item of `list` not covered by its checkpoint
    ///
    /// The whole list is validated first; an invalid list is reported and
    /// rejected without a single delivery call. Otherwise the run ends as
    /// [`RunStatus::Completed`], [`RunStatus::Halted`] on a fatal error (the
    /// checkpoint stays at the last completed item) or
    /// [`RunStatus::Interrupted`] when `shutdown` fires during a wait.
    ///
    /// # Errors
    /// If the list fails validation
    #[tracing::instrument(level = tracing::Level::DEBUG, skip_all, fields(list = list.label()))]
    pub async fn run(
        &self,
        list: &ItemList,
        shutdown: broadcast::Receiver<Signal>,
    ) -> Result<RunSummary, DispatchError> {
        if let Err(err) = list.validate(&self.engine.config().limits) {
            self.reporter
                .report(&ProgressEvent::ValidationFailed {
                    label: list.label().to_string(),
                    index: err.index(),
                    reason: err.to_string(),
                })
                .await;
            return Err(err.into());
        }

        let key = ListKey::derive(list);
        let mut checkpoint = self.store.load(&key).await;
        let total = list.len();
        let start = checkpoint.next_index().min(total);

        let mut summary = RunSummary::new(list.label(), total, start);
        let mut rate = RateController::new(self.config.rate.clone());
        let mut shutdown = Shutdown::new(shutdown);

        internal!(
            level = INFO,
            "Dispatching {} ({key}): {total} items, resuming at #{start}",
            list.label()
        );
        self.reporter
            .report(&ProgressEvent::Started {
                label: list.label().to_string(),
                total,
                resume_from: start,
            })
            .await;

        for item in list.items().iter().filter(|item| item.index() >= start) {
            let index = item.index();

            if shutdown.requested() {
                return Ok(self.interrupted(index, summary).await);
            }

            let terminal = match self.attempt(item, &mut rate, &mut summary, &mut shutdown).await {
                Step::Done(terminal) => terminal,
                Step::Interrupted => return Ok(self.interrupted(index, summary).await),
            };

            let burst_pause = match terminal {
                Terminal::Sent => {
                    checkpoint.advance(index);
                    summary.sent += 1;
                    rate.on_success();
                    rate.record_completion()
                }
                Terminal::Skipped(reason) => {
                    internal!(level = INFO, "Skipped {} item #{index}: {reason}", item.kind_name());
                    checkpoint.advance(index);
                    summary.skipped += 1;
                    rate.on_success();
                    rate.record_completion()
                }
                Terminal::Failed(reason) => {
                    checkpoint.record_failure(index);
                    summary.failed += 1;
                    self.reporter
                        .report(&ProgressEvent::ItemFailed {
                            index,
                            kind: item.kind_name(),
                            reason,
                        })
                        .await;
                    None
                }
                Terminal::Fatal(reason) => return Ok(self.halt(item, reason, summary).await),
            };

            if let Err(err) = self.store.save(&key, &checkpoint).await {
                let reason = FatalError::Checkpoint(err.to_string()).to_string();
                return Ok(self.halt(item, reason, summary).await);
            }

            if self.config.report_every > 0 && summary.completed() % self.config.report_every == 0 {
                self.reporter
                    .report(&ProgressEvent::Progress {
                        summary: summary.clone(),
                        last_index: index,
                    })
                    .await;
            }

            if index + 1 >= total {
                break;
            }

            let wait = match burst_pause {
                Some(pause) => {
                    internal!(
                        level = INFO,
                        "Burst complete at #{index}, pausing {}s",
                        pause.as_secs()
                    );
                    summary.burst_pauses += 1;
                    pause
                }
                None => rate.pacing_delay(),
            };

            if shutdown.sleep(wait).await {
                return Ok(self.interrupted(index + 1, summary).await);
            }
        }

        internal!(
            level = INFO,
            "Finished {}: {} sent, {} skipped, {} failed",
            list.label(),
            summary.sent,
            summary.skipped,
            summary.failed
        );
        summary.status = RunStatus::Completed;
        self.reporter
            .report(&ProgressEvent::Completed {
                summary: summary.clone(),
            })
            .await;

        Ok(summary)
    }

    /// Drive one item until it reaches a terminal outcome
    async fn attempt(
        &self,
        item: &WorkItem,
        rate: &mut RateController,
        summary: &mut RunSummary,
        shutdown: &mut Shutdown,
    ) -> Step {
        let mut state = ItemState::Attempting { attempt: 1 };

        loop {
            state = match state {
                ItemState::Attempting { attempt } => {
                    self.try_once(item, attempt, rate, summary).await
                }
                ItemState::RetryWait {
                    attempt,
                    wait,
                    cause,
                } => {
                    if shutdown.sleep(wait).await {
                        return Step::Interrupted;
                    }

                    match cause {
                        RetryCause::RateLimited => ItemState::Attempting { attempt },
                        RetryCause::Failed(reason) => {
                            internal!(
                                level = DEBUG,
                                "Retrying item #{} (attempt {}) after: {reason}",
                                item.index(),
                                attempt + 1
                            );
                            summary.retries += 1;
                            ItemState::Attempting {
                                attempt: attempt + 1,
                            }
                        }
                    }
                }
                ItemState::Done(terminal) => return Step::Done(terminal),
            };
        }
    }

    async fn try_once(
        &self,
        item: &WorkItem,
        attempt: u32,
        rate: &mut RateController,
        summary: &mut RunSummary,
    ) -> ItemState {
        match self.engine.deliver(item).await {
            DeliveryOutcome::Sent => ItemState::Done(Terminal::Sent),
            DeliveryOutcome::Skipped { reason } => ItemState::Done(Terminal::Skipped(reason)),
            DeliveryOutcome::RateLimited { retry_after_secs } => {
                let wait = rate.on_rate_limited(retry_after_secs);
                summary.rate_limit_waits += 1;

                internal!(
                    level = WARN,
                    "Rate limited at item #{}, waiting {}s",
                    item.index(),
                    wait.as_secs()
                );
                self.reporter
                    .report(&ProgressEvent::RateLimited {
                        index: item.index(),
                        wait_secs: wait.as_secs(),
                    })
                    .await;

                ItemState::RetryWait {
                    attempt,
                    wait,
                    cause: RetryCause::RateLimited,
                }
            }
            DeliveryOutcome::Failed { reason } => {
                let policy = &self.config.retry;

                if policy.should_retry(attempt) {
                    internal!(
                        level = WARN,
                        "Item #{} failed (attempt {attempt}/{}, {} left): {reason}",
                        item.index(),
                        policy.max_attempts,
                        policy.remaining_attempts(attempt)
                    );
                    ItemState::RetryWait {
                        attempt,
                        wait: policy.backoff(attempt),
                        cause: RetryCause::Failed(reason),
                    }
                } else {
                    let reason = format!("gave up after {attempt} attempts: {reason}");
                    if policy.halt_on_failure {
                        ItemState::Done(Terminal::Fatal(reason))
                    } else {
                        ItemState::Done(Terminal::Failed(reason))
                    }
                }
            }
            DeliveryOutcome::Fatal { reason } => ItemState::Done(Terminal::Fatal(reason)),
        }
    }

    async fn halt(&self, item: &WorkItem, reason: String, mut summary: RunSummary) -> RunSummary {
        internal!(
            level = ERROR,
            "Halting at {} item #{}: {reason}",
            item.kind_name(),
            item.index()
        );

        summary.status = RunStatus::Halted {
            index: item.index(),
            kind: item.kind_name(),
            reason: reason.clone(),
        };
        self.reporter
            .report(&ProgressEvent::Halted {
                index: item.index(),
                kind: item.kind_name(),
                reason,
                summary: summary.clone(),
            })
            .await;

        summary
    }

    async fn interrupted(&self, next_index: u64, mut summary: RunSummary) -> RunSummary {
        internal!(
            level = WARN,
            "Shutdown requested, stopping before item #{next_index}"
        );

        summary.status = RunStatus::Interrupted;
        self.reporter
            .report(&ProgressEvent::Interrupted {
                next_index,
                summary: summary.clone(),
            })
            .await;

        summary
    }
}
