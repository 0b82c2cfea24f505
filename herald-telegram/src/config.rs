use core::fmt;
use std::time::Duration;

use herald_common::ChatRef;
use serde::Deserialize;

use crate::error::TelegramError;

mod defaults {
    pub fn api_base() -> String {
        "https://api.telegram.org".to_string()
    }

    pub fn token_env() -> String {
        "BOT_TOKEN".to_string()
    }

    pub const fn timeout_secs() -> u64 {
        30
    }

    pub const fn connect_timeout_secs() -> u64 {
        10
    }

    pub const fn report_timeout_secs() -> u64 {
        10
    }
}

/// How to reach the Bot API
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramConfig {
    /// Default: `https://api.telegram.org`
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Bot token; prefer `token_env` so the secret stays out of config files
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable holding the token when `token` is unset
    ///
    /// Default: `BOT_TOKEN`
    #[serde(default = "defaults::token_env")]
    pub token_env: String,

    /// Whole-request timeout
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,

    /// Default: 10 seconds
    #[serde(default = "defaults::connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Chat the bot may forward into and clean up again, used to find out
    /// what an uncopyable message contains
    ///
    /// Without one, uncopyable messages are skipped.
    #[serde(default)]
    pub scratch_chat: Option<ChatRef>,

    /// Upper bound for posting one progress report
    ///
    /// Default: 10 seconds
    #[serde(default = "defaults::report_timeout_secs")]
    pub report_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            token: None,
            token_env: defaults::token_env(),
            timeout_secs: defaults::timeout_secs(),
            connect_timeout_secs: defaults::connect_timeout_secs(),
            scratch_chat: None,
            report_timeout_secs: defaults::report_timeout_secs(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("scratch_chat", &self.scratch_chat)
            .field("report_timeout_secs", &self.report_timeout_secs)
            .finish()
    }
}

impl TelegramConfig {
    /// The configured token, or the one in `token_env`
    ///
    /// # Errors
    /// If neither is set
    pub fn resolve_token(&self) -> Result<String, TelegramError> {
        if let Some(token) = self.token.as_ref().filter(|token| !token.trim().is_empty()) {
            return Ok(token.trim().to_string());
        }

        std::env::var(&self.token_env)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| TelegramError::MissingToken(self.token_env.clone()))
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub const fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }
}
