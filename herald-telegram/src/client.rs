use core::fmt;
use std::collections::BTreeMap;

use async_trait::async_trait;
use herald_common::{ChatRef, incoming, internal, outgoing};
use herald_delivery::{Media, MediaKind, Platform, PlatformError, PollRequest, SourceContent};
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};

use crate::{
    config::TelegramConfig,
    error::TelegramError,
    types::{
        ApiResponse, CopyMessage, DeleteMessage, ForwardMessage, LinkPreviewOptions, Message,
        MessageId, SendMedia, SendMessage, SendPoll,
    },
};

/// Longest response body quoted in an error when it is not a Bot API envelope
const RAW_BODY_PREVIEW: usize = 200;

/// Bot API method and file field for each kind of media
const fn media_method(kind: MediaKind) -> (&'static str, &'static str) {
    match kind {
        MediaKind::Photo => ("sendPhoto", "photo"),
        MediaKind::Video => ("sendVideo", "video"),
        MediaKind::Document => ("sendDocument", "document"),
        MediaKind::Audio => ("sendAudio", "audio"),
        MediaKind::Voice => ("sendVoice", "voice"),
        MediaKind::Animation => ("sendAnimation", "animation"),
        MediaKind::Sticker => ("sendSticker", "sticker"),
    }
}

/// A Telegram bot, talking JSON to the Bot API
#[derive(Clone)]
pub struct BotClient {
    http: Client,
    api_base: String,
    token: String,
    scratch_chat: Option<ChatRef>,
}

impl fmt::Debug for BotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotClient")
            .field("api_base", &self.api_base)
            .field("scratch_chat", &self.scratch_chat)
            .finish_non_exhaustive()
    }
}

impl BotClient {
    /// Build a client from `config`, resolving the token
    ///
    /// # Errors
    /// If no token is configured or the HTTP client cannot be created
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("herald/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.resolve_token()?,
            scratch_chat: config.scratch_chat.clone(),
        })
    }

    /// Call one Bot API method with a JSON body
    ///
    /// # Errors
    /// On transport failures, `ok: false` envelopes and unreadable responses
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        outgoing!(level = DEBUG, "POST {}/bot<token>/{method}", self.api_base);

        let response = self
            .http
            .post(format!("{}/bot{}/{method}", self.api_base, self.token))
            .json(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        incoming!(level = DEBUG, "{method}: HTTP {status}, {} bytes", body.len());

        match serde_json::from_slice::<ApiResponse<R>>(&body) {
            Ok(envelope) => envelope.into_result(status.as_u16()),
            Err(_) if !status.is_success() => {
                let text = String::from_utf8_lossy(&body);
                Err(TelegramError::Api {
                    code: status.as_u16(),
                    description: text.chars().take(RAW_BODY_PREVIEW).collect(),
                    retry_after: None,
                })
            }
            Err(err) => Err(TelegramError::Decode(format!("{method}: {err}"))),
        }
    }

    /// Post `text` without a link preview
    ///
    /// # Errors
    /// See [`BotClient::call`]
    pub async fn send_message(&self, chat: &ChatRef, text: &str) -> Result<Message, TelegramError> {
        self.call(
            "sendMessage",
            &SendMessage {
                chat_id: chat,
                text,
                link_preview_options: LinkPreviewOptions { is_disabled: true },
            },
        )
        .await
    }
}

#[async_trait]
impl Platform for BotClient {
    async fn copy_message(
        &self,
        source: &ChatRef,
        message_id: i64,
        destination: &ChatRef,
    ) -> Result<(), PlatformError> {
        let copy: MessageId = self
            .call(
                "copyMessage",
                &CopyMessage {
                    chat_id: destination,
                    from_chat_id: source,
                    message_id,
                },
            )
            .await?;

        internal!(
            level = TRACE,
            "Copied {source}/{message_id} as {destination}/{}",
            copy.message_id
        );
        Ok(())
    }

    async fn send_text(&self, destination: &ChatRef, text: &str) -> Result<(), PlatformError> {
        self.send_message(destination, text).await?;
        Ok(())
    }

    async fn send_poll(
        &self,
        destination: &ChatRef,
        poll: &PollRequest,
    ) -> Result<(), PlatformError> {
        let _: IgnoredAny = self
            .call("sendPoll", &SendPoll::new(destination, poll))
            .await?;
        Ok(())
    }

    async fn send_media(&self, destination: &ChatRef, media: &Media) -> Result<(), PlatformError> {
        let (method, field) = media_method(media.kind);
        let body = SendMedia {
            chat_id: destination,
            file: BTreeMap::from([(field, media.file_id.as_str())]),
            caption: media.caption.as_deref().filter(|_| media.kind.has_caption()),
        };

        let _: IgnoredAny = self.call(method, &body).await?;
        Ok(())
    }

    async fn delete_message(&self, chat: &ChatRef, message_id: i64) -> Result<(), PlatformError> {
        let _: IgnoredAny = self
            .call(
                "deleteMessage",
                &DeleteMessage {
                    chat_id: chat,
                    message_id,
                },
            )
            .await?;
        Ok(())
    }

    /// Forward the message into the scratch chat, read it, then remove the
    /// scratch copy again
    async fn inspect_message(
        &self,
        source: &ChatRef,
        message_id: i64,
    ) -> Result<SourceContent, PlatformError> {
        let Some(scratch) = &self.scratch_chat else {
            internal!(
                level = WARN,
                "Cannot inspect {source}/{message_id}: no scratch chat configured"
            );
            return Ok(SourceContent::Unsupported("uninspectable".to_string()));
        };

        let forwarded: Message = self
            .call(
                "forwardMessage",
                &ForwardMessage {
                    chat_id: scratch,
                    from_chat_id: source,
                    message_id,
                    disable_notification: true,
                },
            )
            .await?;

        let scratch_id = forwarded.message_id;
        let content = forwarded.into_content();

        if let Err(err) = self
            .call::<_, IgnoredAny>(
                "deleteMessage",
                &DeleteMessage {
                    chat_id: scratch,
                    message_id: scratch_id,
                },
            )
            .await
        {
            internal!(
                level = WARN,
                "Failed to clean up scratch copy {scratch}/{scratch_id}: {err}"
            );
        }

        Ok(content)
    }
}
