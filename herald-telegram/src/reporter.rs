use std::time::Duration;

use async_trait::async_trait;
use herald_common::{ChatRef, PlatformLimits, internal};
use herald_delivery::{ProgressEvent, Reporter, engine::text::truncate_chars};

use crate::client::BotClient;

/// Posts progress events to a log chat
///
/// A post that fails or takes longer than the timeout is logged and dropped.
#[derive(Debug, Clone)]
pub struct TelegramReporter {
    client: BotClient,
    chat: ChatRef,
    timeout: Duration,
    max_chars: usize,
}

impl TelegramReporter {
    #[must_use]
    pub fn new(client: BotClient, chat: ChatRef, timeout: Duration) -> Self {
        Self {
            client,
            chat,
            timeout,
            max_chars: PlatformLimits::default().message_max_chars,
        }
    }
}

#[async_trait]
impl Reporter for TelegramReporter {
    async fn report(&self, event: &ProgressEvent) {
        let text = truncate_chars(&event.to_string(), self.max_chars);

        match tokio::time::timeout(self.timeout, self.client.send_message(&self.chat, &text)).await
        {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                internal!(level = WARN, "Failed to post report to {}: {err}", self.chat);
            }
            Err(_) => {
                internal!(
                    level = WARN,
                    "Posting report to {} timed out after {}s",
                    self.chat,
                    self.timeout.as_secs()
                );
            }
        }
    }
}
