//! Where item lists come from
//!
//! Every source is read in full and turned into an [`ItemList`] before the
//! first delivery call. Anything wrong with a source is reported as a
//! [`SourceError`] and aborts the run without side effects.

pub mod link;
pub mod range;
pub mod records;

use std::path::{Path, PathBuf};

use herald_common::{ChatRef, ItemList, ValidationError, internal};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid Telegram link: {0}")]
    InvalidLink(String),

    /// A forward range needs a start and an end link
    #[error("Expected at least two t.me links, found {0}")]
    TooFewLinks(usize),

    /// The two ends of a range point into different chats
    #[error("Range links point to different chats: {first} and {second}")]
    MixedChats { first: ChatRef, second: ChatRef },

    /// A delete range file lacks its `START=` or `END=` line
    #[error("Missing {0}=<link> line")]
    MissingBound(&'static str),

    #[error("Range of {span} messages exceeds the maximum of {max}")]
    RangeTooLarge { span: u64, max: u64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A file to build the item list from
///
/// ```ron
/// source: ForwardRange(path: "ranges/forward.txt", max_span: 5000),
/// source: DeleteRange(path: "ranges/delete_range.txt", chat: Some(-1001234567890)),
/// source: Questions(path: "questions.json"),
/// source: Records(path: "items.json"),
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Source {
    /// Free text holding two links into the same channel
    ForwardRange {
        path: PathBuf,
        /// Largest number of messages the range may cover
        ///
        /// Default: 100000
        #[serde(default = "defaults::max_span")]
        max_span: u64,
    },

    /// `START=<link>` and `END=<link>` lines
    DeleteRange {
        path: PathBuf,
        /// Chat to delete from when the links are public `t.me/<name>` ones
        #[serde(default)]
        chat: Option<ChatRef>,
        /// Default: 100000
        #[serde(default = "defaults::max_span")]
        max_span: u64,
    },

    /// JSON array of quiz questions
    Questions { path: PathBuf },

    /// JSON array of items tagged with their `kind`
    Records { path: PathBuf },
}

mod defaults {
    pub const fn max_span() -> u64 {
        100_000
    }
}

impl Source {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::ForwardRange { path, .. }
            | Self::DeleteRange { path, .. }
            | Self::Questions { path }
            | Self::Records { path } => path,
        }
    }

    /// Name the list is reported and checkpointed under
    #[must_use]
    pub fn label(&self) -> String {
        self.path().file_name().map_or_else(
            || self.path().display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    /// Read and parse the whole source
    ///
    /// # Errors
    /// If the file cannot be read or parsed, or it holds no items
    pub fn load(&self) -> Result<ItemList, SourceError> {
        let path = self.path();
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let label = self.label();

        let list = match self {
            Self::ForwardRange { max_span, .. } => range::forward(&label, &text, *max_span)?,
            Self::DeleteRange { chat, max_span, .. } => {
                range::delete(&label, &text, chat.as_ref(), *max_span)?
            }
            Self::Questions { .. } => records::questions(&label, &text).map_err(|source| {
                SourceError::Json {
                    path: path.to_path_buf(),
                    source,
                }
            })?,
            Self::Records { .. } => {
                records::records(&label, &text).map_err(|source| SourceError::Json {
                    path: path.to_path_buf(),
                    source,
                })?
            }
        };

        if list.is_empty() {
            return Err(ValidationError::Empty(label).into());
        }

        internal!(
            level = DEBUG,
            "Loaded {} items from {}",
            list.len(),
            path.display()
        );
        Ok(list)
    }
}
