//! The unit of dispatch work.
//!
//! An [`ItemList`] is built once, in full, before dispatch starts. Each
//! [`WorkItem`] carries the index it was given at load time; indices start at
//! zero, increase by one in submission order and are never reused. Items are
//! immutable after construction.

use serde::{Deserialize, Serialize};

use crate::{ChatRef, PlatformLimits, ValidationError};

/// Copy one message out of a source channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardEntry {
    pub source_chat: ChatRef,
    pub message_id: i64,
}

/// A poll, or a quiz when `correct_option` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollItem {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default, alias = "correct_option_id")]
    pub correct_option: Option<usize>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A plain text message of any length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageItem {
    pub text: String,
}

/// Remove one message from a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEntry {
    pub chat: ChatRef,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    #[serde(rename = "forward")]
    ForwardRangeEntry(ForwardEntry),
    Poll(PollItem),
    Message(MessageItem),
    #[serde(rename = "delete")]
    DeleteEntry(DeleteEntry),
}

impl ItemKind {
    /// Short name used in logs and reports
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ForwardRangeEntry(_) => "forward",
            Self::Poll(_) => "poll",
            Self::Message(_) => "message",
            Self::DeleteEntry(_) => "delete",
        }
    }
}

/// An item together with its position in the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    index: u64,
    kind: ItemKind,
}

impl WorkItem {
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.index
    }

    #[must_use]
    pub const fn kind(&self) -> &ItemKind {
        &self.kind
    }

    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Check the item against the hard platform limits
    ///
    /// Poll questions and explanations are not checked for length here: the
    /// delivery engine truncates those deterministically.
    ///
    /// # Errors
    /// The first problem found with this item
    pub fn validate(&self, limits: &PlatformLimits) -> Result<(), ValidationError> {
        let index = self.index;

        match &self.kind {
            ItemKind::ForwardRangeEntry(ForwardEntry { message_id, .. })
            | ItemKind::DeleteEntry(DeleteEntry { message_id, .. }) => {
                if *message_id <= 0 {
                    return Err(ValidationError::InvalidMessageId {
                        index,
                        kind: self.kind_name(),
                        message_id: *message_id,
                    });
                }
            }
            ItemKind::Message(MessageItem { text }) => {
                if text.trim().is_empty() {
                    return Err(ValidationError::MissingField {
                        index,
                        kind: "message",
                        field: "text",
                    });
                }
            }
            ItemKind::Poll(poll) => validate_poll(index, poll, limits)?,
        }

        Ok(())
    }
}

fn validate_poll(index: u64, poll: &PollItem, limits: &PlatformLimits) -> Result<(), ValidationError> {
    if poll.question.trim().is_empty() {
        return Err(ValidationError::MissingField {
            index,
            kind: "poll",
            field: "question",
        });
    }

    let count = poll.options.len();
    if !(limits.poll_min_options..=limits.poll_max_options).contains(&count) {
        return Err(ValidationError::OptionCount {
            index,
            count,
            min: limits.poll_min_options,
            max: limits.poll_max_options,
        });
    }

    for option in &poll.options {
        if option.trim().is_empty() {
            return Err(ValidationError::MissingField {
                index,
                kind: "poll",
                field: "option",
            });
        }

        let length = option.chars().count();
        if length > limits.poll_option_max_chars {
            return Err(ValidationError::TooLong {
                index,
                kind: "poll",
                field: "option",
                length,
                limit: limits.poll_option_max_chars,
            });
        }
    }

    if let Some(correct) = poll.correct_option
        && correct >= count
    {
        return Err(ValidationError::CorrectOptionOutOfRange {
            index,
            correct,
            count,
        });
    }

    Ok(())
}

/// The full, ordered list of work for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemList {
    label: String,
    items: Vec<WorkItem>,
}

impl ItemList {
    /// Build a list, assigning indices in iteration order
    pub fn new(label: impl Into<String>, kinds: impl IntoIterator<Item = ItemKind>) -> Self {
        let items = kinds
            .into_iter()
            .zip(0u64..)
            .map(|(kind, index)| WorkItem { index, kind })
            .collect();

        Self {
            label: label.into(),
            items,
        }
    }

    /// Human readable name of where the items came from
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        u64::try_from(self.items.len()).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Validate every item, stopping at the first problem
    ///
    /// # Errors
    /// The first invalid item, in index order
    pub fn validate(&self, limits: &PlatformLimits) -> Result<(), ValidationError> {
        self.items.iter().try_for_each(|item| item.validate(limits))
    }
}
