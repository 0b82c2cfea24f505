use serde::{Deserialize, Serialize};

/// Hard size limits of the remote platform
///
/// Lengths are counted in characters. The defaults are the Bot API limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformLimits {
    /// Maximum length of a text message
    ///
    /// Default: 4096
    #[serde(default = "defaults::message_max_chars")]
    pub message_max_chars: usize,

    /// Maximum length of a poll question
    ///
    /// Default: 300
    #[serde(default = "defaults::poll_question_max_chars")]
    pub poll_question_max_chars: usize,

    /// Maximum length of a single poll option
    ///
    /// Default: 100
    #[serde(default = "defaults::poll_option_max_chars")]
    pub poll_option_max_chars: usize,

    /// Maximum length of a quiz explanation
    ///
    /// Default: 200
    #[serde(default = "defaults::poll_explanation_max_chars")]
    pub poll_explanation_max_chars: usize,

    /// Minimum number of poll options
    ///
    /// Default: 2
    #[serde(default = "defaults::poll_min_options")]
    pub poll_min_options: usize,

    /// Maximum number of poll options
    ///
    /// Default: 10
    #[serde(default = "defaults::poll_max_options")]
    pub poll_max_options: usize,
}

impl Default for PlatformLimits {
    fn default() -> Self {
        Self {
            message_max_chars: defaults::message_max_chars(),
            poll_question_max_chars: defaults::poll_question_max_chars(),
            poll_option_max_chars: defaults::poll_option_max_chars(),
            poll_explanation_max_chars: defaults::poll_explanation_max_chars(),
            poll_min_options: defaults::poll_min_options(),
            poll_max_options: defaults::poll_max_options(),
        }
    }
}

mod defaults {
    pub const fn message_max_chars() -> usize {
        4096
    }

    pub const fn poll_question_max_chars() -> usize {
        300
    }

    pub const fn poll_option_max_chars() -> usize {
        100
    }

    pub const fn poll_explanation_max_chars() -> usize {
        200
    }

    pub const fn poll_min_options() -> usize {
        2
    }

    pub const fn poll_max_options() -> usize {
        10
    }
}
