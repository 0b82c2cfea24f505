use herald_delivery::PlatformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered with `ok: false`
    #[error("Bot API error {code}: {description}")]
    Api {
        code: u16,
        description: String,
        retry_after: Option<i64>,
    },

    #[error("Malformed Bot API response: {0}")]
    Decode(String),

    /// Neither `token` nor the `token_env` variable is set
    #[error("No bot token configured: set `token` or the {0} environment variable")]
    MissingToken(String),
}

impl From<TelegramError> for PlatformError {
    fn from(error: TelegramError) -> Self {
        match error {
            TelegramError::Api {
                code,
                description,
                retry_after,
            } => Self::Api {
                code,
                description,
                retry_after,
            },
            TelegramError::Http(err) if err.is_timeout() => Self::Timeout(err.to_string()),
            TelegramError::Http(err) if err.is_decode() => Self::Decode(err.to_string()),
            TelegramError::Http(err) => Self::Network(err.to_string()),
            TelegramError::Decode(msg) => Self::Decode(msg),
            err @ TelegramError::MissingToken(_) => Self::api(401, err.to_string()),
        }
    }
}
