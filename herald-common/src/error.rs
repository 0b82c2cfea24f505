//! Validation errors for work items.
//!
//! Anything reported here is detected before the first remote call, so a run
//! that fails validation has no side effects at the destination.

use thiserror::Error;

/// Errors found while validating an item list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A chat reference could not be understood.
    #[error("Invalid chat reference: {0}")]
    InvalidChat(String),

    /// A required field is empty or missing.
    #[error("Item {index} ({kind}): missing required field `{field}`")]
    MissingField {
        index: u64,
        kind: &'static str,
        field: &'static str,
    },

    /// A poll has too few or too many options.
    #[error("Item {index} (poll): {count} options given, expected {min}..={max}")]
    OptionCount {
        index: u64,
        count: usize,
        min: usize,
        max: usize,
    },

    /// A field is longer than the platform accepts and cannot be repaired.
    #[error("Item {index} ({kind}): `{field}` is {length} characters, limit is {limit}")]
    TooLong {
        index: u64,
        kind: &'static str,
        field: &'static str,
        length: usize,
        limit: usize,
    },

    /// The correct option of a quiz points outside its options.
    #[error("Item {index} (poll): correct option {correct} is out of range for {count} options")]
    CorrectOptionOutOfRange {
        index: u64,
        correct: usize,
        count: usize,
    },

    /// A message identifier is not positive.
    #[error("Item {index} ({kind}): invalid message id {message_id}")]
    InvalidMessageId {
        index: u64,
        kind: &'static str,
        message_id: i64,
    },

    /// The list contains no items at all.
    #[error("Item list `{0}` is empty")]
    Empty(String),
}

impl ValidationError {
    /// The index of the offending item, if the error is about a single item
    #[must_use]
    pub const fn index(&self) -> Option<u64> {
        match self {
            Self::MissingField { index, .. }
            | Self::OptionCount { index, .. }
            | Self::TooLong { index, .. }
            | Self::CorrectOptionOutOfRange { index, .. }
            | Self::InvalidMessageId { index, .. } => Some(*index),
            Self::InvalidChat(_) | Self::Empty(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::OptionCount {
            index: 9,
            count: 1,
            min: 2,
            max: 10,
        };
        assert_eq!(
            err.to_string(),
            "Item 9 (poll): 1 options given, expected 2..=10"
        );
        assert_eq!(err.index(), Some(9));

        let err = ValidationError::Empty("questions.json".to_string());
        assert_eq!(err.to_string(), "Item list `questions.json` is empty");
        assert_eq!(err.index(), None);
    }
}
