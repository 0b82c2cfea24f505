use core::fmt::{self, Display, Formatter};

use herald_common::ItemList;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

const MAX_SLUG_LEN: usize = 48;

/// Identity of an item list, used to key its checkpoint
///
/// Keys only contain `[A-Za-z0-9_-]` so they are safe to use as file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListKey(String);

impl ListKey {
    /// Wrap an existing key
    ///
    /// # Errors
    /// If the key is empty or contains characters outside `[A-Za-z0-9_-]`
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidKey(key));
        }

        Ok(Self(key))
    }

    /// Derive the key for a list from its label and a fingerprint of its items
    ///
    /// Two lists with the same label but different contents get different keys.
    #[must_use]
    pub fn derive(list: &ItemList) -> Self {
        let mut slug: String = list
            .label()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .take(MAX_SLUG_LEN)
            .collect();
        if slug.is_empty() {
            slug.push_str("items");
        }

        let encoded = serde_json::to_vec(list.items()).unwrap_or_default();
        let digest = Sha256::digest(&encoded);
        let fingerprint: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();

        Self(format!("{slug}-{fingerprint}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ListKey {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// Progress of one item list
///
/// `last_completed == None` means nothing has been completed yet (the `-1`
/// checkpoint). `failed` holds indices that ended in a failure and were moved
/// past so an operator can follow them up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    last_completed: Option<u64>,
    failed: Vec<u64>,
    updated_at: u64,
}

impl Checkpoint {
    #[must_use]
    pub const fn last_completed(&self) -> Option<u64> {
        self.last_completed
    }

    /// The last completed index, with `-1` for "nothing done yet"
    #[must_use]
    pub fn last_completed_index(&self) -> i64 {
        self.last_completed
            .map_or(-1, |index| i64::try_from(index).unwrap_or(i64::MAX))
    }

    /// The first index a resumed run should attempt
    #[must_use]
    pub fn next_index(&self) -> u64 {
        self.last_completed.map_or(0, |index| index.saturating_add(1))
    }

    #[must_use]
    pub fn failed(&self) -> &[u64] {
        &self.failed
    }

    /// Unix timestamp of the last change
    #[must_use]
    pub const fn updated_at(&self) -> u64 {
        self.updated_at
    }

    /// Mark `index` as completed; the checkpoint never moves backwards
    pub fn advance(&mut self, index: u64) {
        self.last_completed = Some(self.last_completed.map_or(index, |last| last.max(index)));
        self.touch();
    }

    /// Mark `index` as failed and move past it
    pub fn record_failure(&mut self, index: u64) {
        if let Err(position) = self.failed.binary_search(&index) {
            self.failed.insert(position, index);
        }
        self.advance(index);
    }

    /// Combine with another record of the same list, keeping the furthest
    /// progress and every failure either side knows about
    pub fn merge(&mut self, other: &Self) {
        if let Some(index) = other.last_completed {
            self.last_completed = Some(self.last_completed.map_or(index, |last| last.max(index)));
        }
        for index in &other.failed {
            if let Err(position) = self.failed.binary_search(index) {
                self.failed.insert(position, *index);
            }
        }
        self.updated_at = self.updated_at.max(other.updated_at);
    }

    fn touch(&mut self) {
        self.updated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
    }
}
