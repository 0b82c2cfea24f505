//! The remote operations the engine is built on
//!
//! The engine never talks to a platform directly. It calls the primitives of
//! [`Platform`] and only looks at the outcome: success, or a [`PlatformError`]
//! which is then classified into a [`crate::DeliveryError`].

use core::fmt;

use async_trait::async_trait;
use herald_common::ChatRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw failure reported by a platform call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform answered and refused the request
    #[error("API error {code}: {description}")]
    Api {
        code: u16,
        description: String,
        retry_after: Option<i64>,
    },

    /// The request never got an answer
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The answer could not be understood
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl PlatformError {
    /// Shorthand for an API refusal without a retry hint
    pub fn api(code: u16, description: impl Into<String>) -> Self {
        Self::Api {
            code,
            description: description.into(),
            retry_after: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Audio,
    Voice,
    Animation,
    Sticker,
}

impl MediaKind {
    /// Whether media of this kind can carry a caption
    #[must_use]
    pub const fn has_caption(self) -> bool {
        !matches!(self, Self::Sticker)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Voice => "voice",
            Self::Animation => "animation",
            Self::Sticker => "sticker",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Already uploaded media, re-sent by reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    pub file_id: String,
    pub caption: Option<String>,
}

/// A poll as it is submitted to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRequest {
    pub question: String,
    pub options: Vec<String>,
    /// Set for quizzes
    pub correct_option: Option<usize>,
    /// Only sent for quizzes
    pub explanation: Option<String>,
    pub anonymous: bool,
}

/// What an existing message turned out to contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    Text(String),
    Media(Media),
    Poll(PollRequest),
    /// Anything the fallback chain cannot rebuild; carries the content name
    Unsupported(String),
}

/// A replacement for a copy the platform refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resend {
    Text(String),
    Media(Media),
    Poll(PollRequest),
}

impl Resend {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Media(_) => "media",
            Self::Poll(_) => "poll",
        }
    }
}

/// Delivery primitives of a messaging platform
///
/// Every method is one remote call from the point of view of the engine;
/// implementations must not retry on their own.
#[async_trait]
pub trait Platform: Send + Sync + fmt::Debug {
    /// Copy a message from `source` into `destination`
    async fn copy_message(
        &self,
        source: &ChatRef,
        message_id: i64,
        destination: &ChatRef,
    ) -> Result<(), PlatformError>;

    async fn send_text(&self, destination: &ChatRef, text: &str) -> Result<(), PlatformError>;

    async fn send_poll(&self, destination: &ChatRef, poll: &PollRequest)
    -> Result<(), PlatformError>;

    /// Send media by the id of an existing upload
    async fn send_media(&self, destination: &ChatRef, media: &Media) -> Result<(), PlatformError>;

    async fn delete_message(&self, chat: &ChatRef, message_id: i64) -> Result<(), PlatformError>;

    /// Find out what a message contains without re-posting it to the audience
    async fn inspect_message(
        &self,
        source: &ChatRef,
        message_id: i64,
    ) -> Result<SourceContent, PlatformError>;
}
