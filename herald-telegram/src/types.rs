//! Bot API wire types
//!
//! Only the fields herald reads or sends are modelled; everything else in a
//! response is ignored.

use std::collections::BTreeMap;

use herald_common::ChatRef;
use herald_delivery::{Media, MediaKind, PollRequest, SourceContent};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::TelegramError;

/// Message fields naming content herald cannot rebuild
const UNSUPPORTED_CONTENT: [&str; 10] = [
    "dice",
    "location",
    "venue",
    "contact",
    "game",
    "invoice",
    "video_note",
    "story",
    "giveaway",
    "paid_media",
];

/// The envelope around every Bot API result
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<u16>,
    pub description: Option<String>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<i64>,
    pub migrate_to_chat_id: Option<i64>,
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Unwrap the result, turning `ok: false` into [`TelegramError::Api`]
    ///
    /// `status` is used when the envelope carries no error code.
    ///
    /// # Errors
    /// If the call failed or a successful envelope has no result
    pub fn into_result(self, status: u16) -> Result<T, TelegramError> {
        if !self.ok {
            let mut description = self.description.unwrap_or_default();
            let parameters = self.parameters.unwrap_or_default();

            if let Some(chat_id) = parameters.migrate_to_chat_id {
                description = format!("{description} (migrated to {chat_id})");
            }

            return Err(TelegramError::Api {
                code: self.error_code.unwrap_or(status),
                description,
                retry_after: parameters.retry_after,
            });
        }

        self.result
            .ok_or_else(|| TelegramError::Decode("successful response without a result".to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollOption {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Poll {
    pub question: String,
    pub options: Vec<PollOption>,
    #[serde(rename = "type")]
    pub kind: String,
    pub correct_option_id: Option<usize>,
    pub explanation: Option<String>,
    #[serde(default = "default_anonymous")]
    pub is_anonymous: bool,
}

const fn default_anonymous() -> bool {
    true
}

impl Poll {
    /// The poll as it would be submitted again
    ///
    /// A quiz whose correct answer is not visible to the bot comes back as a
    /// regular poll.
    #[must_use]
    pub fn into_request(self) -> PollRequest {
        let correct_option = self.correct_option_id.filter(|_| self.kind == "quiz");

        PollRequest {
            question: self.question,
            options: self.options.into_iter().map(|option| option.text).collect(),
            explanation: correct_option.and(self.explanation),
            correct_option,
            anonymous: self.is_anonymous,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// Every available size, smallest first
    #[serde(default)]
    pub photo: Vec<FileRef>,
    pub video: Option<FileRef>,
    pub animation: Option<FileRef>,
    pub document: Option<FileRef>,
    pub audio: Option<FileRef>,
    pub voice: Option<FileRef>,
    pub sticker: Option<FileRef>,
    pub poll: Option<Poll>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Result of `copyMessage`
#[derive(Debug, Clone, Deserialize)]
pub struct MessageId {
    pub message_id: i64,
}

impl Message {
    /// What this message contains, as far as it can be sent again
    #[must_use]
    pub fn into_content(mut self) -> SourceContent {
        if let Some(poll) = self.poll {
            return SourceContent::Poll(poll.into_request());
        }

        let caption = self.caption;
        let media = |kind, file: FileRef| {
            SourceContent::Media(Media {
                kind,
                file_id: file.file_id,
                caption: caption.clone(),
            })
        };

        if let Some(largest) = self.photo.pop() {
            return media(MediaKind::Photo, largest);
        }

        // Animations also carry a `document`, so they are checked first
        let files = [
            (MediaKind::Animation, self.animation),
            (MediaKind::Video, self.video),
            (MediaKind::Audio, self.audio),
            (MediaKind::Voice, self.voice),
            (MediaKind::Sticker, self.sticker),
            (MediaKind::Document, self.document),
        ];
        for (kind, file) in files {
            if let Some(file) = file {
                return media(kind, file);
            }
        }

        if let Some(text) = self.text {
            return SourceContent::Text(text);
        }

        SourceContent::Unsupported(
            UNSUPPORTED_CONTENT
                .iter()
                .copied()
                .find(|name| self.other.contains_key(*name))
                .unwrap_or("unknown")
                .to_string(),
        )
    }
}

/// `chat_id` plus the per-kind file field of a `send{Photo,Video,..}` call
#[derive(Debug, Serialize)]
pub struct SendMedia<'a> {
    pub chat_id: &'a ChatRef,
    #[serde(flatten)]
    pub file: BTreeMap<&'static str, &'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct CopyMessage<'a> {
    pub chat_id: &'a ChatRef,
    pub from_chat_id: &'a ChatRef,
    pub message_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ForwardMessage<'a> {
    pub chat_id: &'a ChatRef,
    pub from_chat_id: &'a ChatRef,
    pub message_id: i64,
    pub disable_notification: bool,
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a ChatRef,
    pub text: &'a str,
    pub link_preview_options: LinkPreviewOptions,
}

#[derive(Debug, Default, Serialize)]
pub struct LinkPreviewOptions {
    pub is_disabled: bool,
}

#[derive(Debug, Serialize)]
pub struct InputPollOption<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendPoll<'a> {
    pub chat_id: &'a ChatRef,
    pub question: &'a str,
    pub options: Vec<InputPollOption<'a>>,
    pub is_anonymous: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<&'a str>,
}

impl<'a> SendPoll<'a> {
    pub fn new(chat_id: &'a ChatRef, poll: &'a PollRequest) -> Self {
        Self {
            chat_id,
            question: &poll.question,
            options: poll
                .options
                .iter()
                .map(|text| InputPollOption { text })
                .collect(),
            is_anonymous: poll.anonymous,
            kind: if poll.correct_option.is_some() {
                "quiz"
            } else {
                "regular"
            },
            correct_option_id: poll.correct_option,
            explanation: poll
                .correct_option
                .and(poll.explanation.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteMessage<'a> {
    pub chat_id: &'a ChatRef,
    pub message_id: i64,
}
