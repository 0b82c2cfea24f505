//! In-process platform for dispatch tests
#![allow(dead_code)] // Test utility module - not all methods used in every test
//!
//! - Records every call with the (possibly paused) tokio clock
//! - Fails calls matching a predicate a set number of times
//! - Serves inspected content for the forward fallback chain

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use herald_common::ChatRef;
use herald_delivery::{Media, Platform, PlatformError, PollRequest, SourceContent};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Copy { source: ChatRef, message_id: i64 },
    Text(String),
    Poll(PollRequest),
    Media(Media),
    Delete { chat: ChatRef, message_id: i64 },
    Inspect { message_id: i64 },
}

impl Call {
    pub const fn message_id(&self) -> Option<i64> {
        match self {
            Self::Copy { message_id, .. }
            | Self::Delete { message_id, .. }
            | Self::Inspect { message_id } => Some(*message_id),
            _ => None,
        }
    }
}

type Matcher = Box<dyn Fn(&Call) -> bool + Send + Sync>;

struct Rule {
    matches: Matcher,
    remaining: usize,
    error: PlatformError,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("remaining", &self.remaining)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<(Instant, Call)>,
    rules: Vec<Rule>,
    contents: HashMap<i64, SourceContent>,
}

#[derive(Debug, Default, Clone)]
pub struct MockPlatform {
    state: Arc<Mutex<State>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls matching `matches` with `error`
    pub fn fail_when(
        &self,
        matches: impl Fn(&Call) -> bool + Send + Sync + 'static,
        times: usize,
        error: PlatformError,
    ) -> &Self {
        self.state.lock().unwrap().rules.push(Rule {
            matches: Box::new(matches),
            remaining: times,
            error,
        });
        self
    }

    /// Fail the next `times` calls about `message_id`
    pub fn fail_message(&self, message_id: i64, times: usize, error: PlatformError) -> &Self {
        self.fail_when(
            move |call| call.message_id() == Some(message_id),
            times,
            error,
        )
    }

    /// Content returned when `message_id` is inspected
    pub fn with_content(&self, message_id: i64, content: SourceContent) -> &Self {
        self.state
            .lock()
            .unwrap()
            .contents
            .insert(message_id, content);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Message ids of every copy call, in order
    pub fn copied_ids(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Copy { message_id, .. } => Some(message_id),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((Instant::now(), call.clone()));

        let rule = state
            .rules
            .iter_mut()
            .find(|rule| rule.remaining > 0 && (rule.matches)(&call));

        match rule {
            Some(rule) => {
                rule.remaining -= 1;
                Err(rule.error.clone())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn copy_message(
        &self,
        source: &ChatRef,
        message_id: i64,
        _destination: &ChatRef,
    ) -> Result<(), PlatformError> {
        self.record(Call::Copy {
            source: source.clone(),
            message_id,
        })
    }

    async fn send_text(&self, _destination: &ChatRef, text: &str) -> Result<(), PlatformError> {
        self.record(Call::Text(text.to_string()))
    }

    async fn send_poll(
        &self,
        _destination: &ChatRef,
        poll: &PollRequest,
    ) -> Result<(), PlatformError> {
        self.record(Call::Poll(poll.clone()))
    }

    async fn send_media(&self, _destination: &ChatRef, media: &Media) -> Result<(), PlatformError> {
        self.record(Call::Media(media.clone()))
    }

    async fn delete_message(&self, chat: &ChatRef, message_id: i64) -> Result<(), PlatformError> {
        self.record(Call::Delete {
            chat: chat.clone(),
            message_id,
        })
    }

    async fn inspect_message(
        &self,
        _source: &ChatRef,
        message_id: i64,
    ) -> Result<SourceContent, PlatformError> {
        self.record(Call::Inspect { message_id })?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .contents
            .get(&message_id)
            .cloned()
            .unwrap_or_else(|| SourceContent::Unsupported("unknown".to_string())))
    }
}
