//! Performs the remote work for a single item

pub mod fallback;
pub mod poll;
pub mod text;

use std::sync::Arc;

use herald_common::{
    ChatRef, DeleteEntry, ForwardEntry, ItemKind, MessageItem, PlatformLimits, PollItem, WorkItem,
    internal,
};
use serde::Deserialize;

use crate::{
    error::{DeliveryError, PermanentError, TextField},
    platform::{Platform, Resend},
    types::DeliveryOutcome,
};

mod defaults {
    pub const fn number_questions() -> bool {
        true
    }

    pub const fn anonymous_polls() -> bool {
        true
    }

    pub fn default_explanation() -> Option<String> {
        Some("✅ The correct answer is revealed after you vote.".to_string())
    }

    pub const fn explanation_margin() -> usize {
        5
    }
}

/// What the engine sends and where
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Chat every item is delivered to
    pub destination: ChatRef,

    #[serde(default)]
    pub limits: PlatformLimits,

    /// Prefix poll questions with `Q{n}: `, `n` counting from one
    ///
    /// Default: `true`
    #[serde(default = "defaults::number_questions")]
    pub number_questions: bool,

    /// Default: `true`
    #[serde(default = "defaults::anonymous_polls")]
    pub anonymous_polls: bool,

    /// Explanation for quizzes that do not bring their own
    #[serde(default = "defaults::default_explanation")]
    pub default_explanation: Option<String>,

    /// How far below the limit an over-long explanation is cut
    ///
    /// Default: 5
    #[serde(default = "defaults::explanation_margin")]
    pub explanation_margin: usize,
}

impl EngineConfig {
    #[must_use]
    pub fn new(destination: ChatRef) -> Self {
        Self {
            destination,
            limits: PlatformLimits::default(),
            number_questions: defaults::number_questions(),
            anonymous_polls: defaults::anonymous_polls(),
            default_explanation: defaults::default_explanation(),
            explanation_margin: defaults::explanation_margin(),
        }
    }
}

/// Delivers items through a [`Platform`]
///
/// The engine makes exactly one attempt per call to [`DeliveryEngine::deliver`];
/// waiting and retrying is left to the dispatch loop.
#[derive(Debug, Clone)]
pub struct DeliveryEngine {
    platform: Arc<dyn Platform>,
    config: EngineConfig,
}

impl DeliveryEngine {
    #[must_use]
    pub fn new(platform: Arc<dyn Platform>, config: EngineConfig) -> Self {
        Self { platform, config }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Attempt `item` once
    #[tracing::instrument(level = tracing::Level::DEBUG, skip_all, fields(index = item.index(), kind = item.kind_name()))]
    pub async fn deliver(&self, item: &WorkItem) -> DeliveryOutcome {
        let result = match item.kind() {
            ItemKind::ForwardRangeEntry(entry) => self.forward(entry).await,
            ItemKind::Poll(poll) => self.poll(item.index(), poll).await,
            ItemKind::Message(message) => self.message(message).await,
            ItemKind::DeleteEntry(entry) => self.delete(entry).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(DeliveryError::RateLimited(retry_after_secs)) => {
                DeliveryOutcome::RateLimited { retry_after_secs }
            }
            Err(DeliveryError::Permanent(err)) => DeliveryOutcome::skipped(err.to_string()),
            Err(err @ (DeliveryError::Transient(_) | DeliveryError::Unclassified(_))) => {
                DeliveryOutcome::Failed {
                    reason: err.to_string(),
                }
            }
            Err(DeliveryError::Fatal(err)) => DeliveryOutcome::Fatal {
                reason: err.to_string(),
            },
        }
    }

    async fn forward(&self, entry: &ForwardEntry) -> Result<DeliveryOutcome, DeliveryError> {
        let copied = self
            .platform
            .copy_message(&entry.source_chat, entry.message_id, &self.config.destination)
            .await
            .map_err(DeliveryError::from);

        match copied {
            Ok(()) => Ok(DeliveryOutcome::Sent),
            Err(DeliveryError::Permanent(PermanentError::NotFound(_))) => {
                Ok(DeliveryOutcome::skipped("content no longer exists"))
            }
            Err(DeliveryError::Permanent(reason)) => {
                internal!(
                    level = DEBUG,
                    "Copy of {}/{} refused ({reason}), trying fallbacks",
                    entry.source_chat,
                    entry.message_id
                );
                self.resend(entry).await
            }
            Err(err) => Err(err),
        }
    }

    /// Re-create a message the platform would not copy
    async fn resend(&self, entry: &ForwardEntry) -> Result<DeliveryOutcome, DeliveryError> {
        let inspected = self
            .platform
            .inspect_message(&entry.source_chat, entry.message_id)
            .await
            .map_err(DeliveryError::from);

        let content = match inspected {
            Ok(content) => content,
            Err(DeliveryError::Permanent(PermanentError::NotFound(_))) => {
                return Ok(DeliveryOutcome::skipped("content no longer exists"));
            }
            Err(err) => return Err(err),
        };

        let plan = fallback::plan(&content);
        if plan.is_empty() {
            return Ok(DeliveryOutcome::skipped("unsupported content type"));
        }

        let mut last_rejection = None;
        for (strategy, resend) in plan {
            let sent = match &resend {
                Resend::Text(text) => self.send_chunked(text).await,
                Resend::Media(media) => self
                    .platform
                    .send_media(&self.config.destination, media)
                    .await
                    .map_err(DeliveryError::from),
                Resend::Poll(poll) => self
                    .platform
                    .send_poll(&self.config.destination, poll)
                    .await
                    .map_err(DeliveryError::from),
            };

            match sent {
                Ok(()) => {
                    internal!(
                        level = DEBUG,
                        "Re-created {}/{} using the {strategy} strategy",
                        entry.source_chat,
                        entry.message_id
                    );
                    return Ok(DeliveryOutcome::Sent);
                }
                Err(DeliveryError::Permanent(reason)) => {
                    internal!(
                        level = DEBUG,
                        "The {strategy} strategy was refused: {reason}"
                    );
                    last_rejection = Some(reason);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(DeliveryOutcome::skipped(last_rejection.map_or_else(
            || "unsupported content type".to_string(),
            |reason| format!("every fallback was refused: {reason}"),
        )))
    }

    async fn poll(&self, index: u64, item: &PollItem) -> Result<DeliveryOutcome, DeliveryError> {
        let poll::PreparedPoll {
            mut request,
            follow_up,
        } = poll::prepare(index, item, &self.config);
        let mut repaired: Vec<TextField> = Vec::new();

        loop {
            let sent = self
                .platform
                .send_poll(&self.config.destination, &request)
                .await
                .map_err(DeliveryError::from);

            match sent {
                Ok(()) => break,
                Err(DeliveryError::Permanent(PermanentError::TooLong { field, description })) => {
                    if repaired.contains(&field) || !poll::repair(&mut request, field, &self.config)
                    {
                        return Ok(DeliveryOutcome::skipped(format!(
                            "poll {field} too long: {description}"
                        )));
                    }

                    internal!(
                        level = WARN,
                        "Poll #{index} {field} rejected as too long, shortened and resending"
                    );
                    repaired.push(field);
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(follow_up) = follow_up {
            match self.send_chunked(&follow_up).await {
                Ok(()) => {}
                Err(DeliveryError::Permanent(reason)) => {
                    internal!(
                        level = WARN,
                        "Poll #{index} was sent but its explanation was refused: {reason}"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(DeliveryOutcome::Sent)
    }

    async fn message(&self, item: &MessageItem) -> Result<DeliveryOutcome, DeliveryError> {
        self.send_chunked(&item.text).await?;
        Ok(DeliveryOutcome::Sent)
    }

    async fn delete(&self, entry: &DeleteEntry) -> Result<DeliveryOutcome, DeliveryError> {
        match self
            .platform
            .delete_message(&entry.chat, entry.message_id)
            .await
            .map_err(DeliveryError::from)
        {
            Ok(()) => Ok(DeliveryOutcome::Sent),
            Err(DeliveryError::Permanent(reason)) => Ok(DeliveryOutcome::skipped(reason.to_string())),
            Err(err) => Err(err),
        }
    }

    /// Send `text` in order as chunks that fit one message
    async fn send_chunked(&self, text: &str) -> Result<(), DeliveryError> {
        for chunk in text::chunk(text, self.config.limits.message_max_chars) {
            self.platform
                .send_text(&self.config.destination, &chunk)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_from_ron() {
        let config: EngineConfig = ron::from_str(r#"(destination: "@archive")"#).unwrap();
        assert_eq!(config, EngineConfig::new(ChatRef::Username("@archive".to_string())));
    }

    #[test]
    fn test_engine_config_overrides() {
        let config: EngineConfig = ron::from_str(
            r#"(destination: -1001234, number_questions: false, default_explanation: None)"#,
        )
        .unwrap();
        assert_eq!(config.destination, ChatRef::Id(-1_001_234));
        assert!(!config.number_questions);
        assert_eq!(config.default_explanation, None);
    }
}
