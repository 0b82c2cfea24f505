//! Typed errors for delivery and dispatch.
//!
//! Every raw [`PlatformError`] is classified into a [`DeliveryError`] which
//! decides what the dispatch loop does next:
//! - `RateLimited`: wait as long as the platform asked, then try again
//! - `Permanent`: this call shape will never work; fall back, repair or skip
//! - `Transient`: try the same item again after a backoff
//! - `Fatal`: every following item would fail too; stop the run
//! - `Unclassified`: unknown failure, retried like a transient one

use herald_common::ValidationError;
use thiserror::Error;

use crate::platform::PlatformError;

/// Top-level delivery error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The platform asked us to wait this many seconds.
    #[error("Rate limited, retry after {0}s")]
    RateLimited(i64),

    #[error("Permanent rejection: {0}")]
    Permanent(#[from] PermanentError),

    #[error("Transient failure: {0}")]
    Transient(#[from] TransientError),

    #[error("Fatal error: {0}")]
    Fatal(#[from] FatalError),

    #[error("Unclassified failure: {0}")]
    Unclassified(String),
}

/// A text field the platform can reject as too long
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Question,
    Explanation,
    Option,
    Text,
}

impl std::fmt::Display for TextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Question => "question",
            Self::Explanation => "explanation",
            Self::Option => "option",
            Self::Text => "text",
        })
    }
}

/// The request can never succeed in this shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermanentError {
    /// The content no longer exists (or never did).
    #[error("Content not found: {0}")]
    NotFound(String),

    /// The content exists but cannot be copied (protected, service message).
    #[error("Content cannot be copied: {0}")]
    CannotCopy(String),

    #[error("Message cannot be deleted: {0}")]
    CannotDelete(String),

    #[error("{field} too long: {description}")]
    TooLong { field: TextField, description: String },

    #[error("Poll not allowed: {0}")]
    PollNotAllowed(String),

    /// Refused for a reason that is known not to change on retry.
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// The request may succeed if repeated later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// The platform failed on its side (5xx, bad gateway).
    #[error("Server error {code}: {description}")]
    Server { code: u16, description: String },
}

/// Every following item would fail the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden, e.g. the bot was removed from the destination.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    /// The API endpoint itself does not exist, usually a malformed token.
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    /// Progress could not be recorded durably.
    #[error("Checkpoint could not be saved: {0}")]
    Checkpoint(String),
}

/// Errors that end a dispatch run before any delivery happened.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

const NOT_FOUND_MARKERS: [&str; 4] = [
    "message to copy not found",
    "message to forward not found",
    "message to delete not found",
    "message not found",
];

const CANNOT_COPY_MARKERS: [&str; 3] = [
    "message can't be copied",
    "message can't be forwarded",
    "has protected content",
];

const FATAL_MARKERS: [&str; 4] = [
    "chat not found",
    "bot was kicked",
    "bot is not a member",
    "need administrator rights",
];

/// Pull `N` out of a description like `Too Many Requests: retry after N`
fn retry_after_in(description: &str) -> Option<i64> {
    let lowered = description.to_ascii_lowercase();
    let (_, rest) = lowered.split_once("retry after")?;
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn too_long_field(description: &str) -> Option<TextField> {
    if !(description.contains("too long")
        || description.contains("must not exceed")
        || description.contains("_too_long"))
    {
        return None;
    }

    Some(if description.contains("question") {
        TextField::Question
    } else if description.contains("explanation") {
        TextField::Explanation
    } else if description.contains("option") {
        TextField::Option
    } else {
        TextField::Text
    })
}

fn classify_api(code: u16, description: String, retry_after: Option<i64>) -> DeliveryError {
    // Explicit rate-limit signal
    if let Some(seconds) = retry_after.or_else(|| retry_after_in(&description)) {
        return DeliveryError::RateLimited(seconds);
    }
    if code == 429 {
        return DeliveryError::RateLimited(1);
    }

    let lowered = description.to_ascii_lowercase();

    // Permanently invalid for this call shape
    if NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
        return PermanentError::NotFound(description).into();
    }
    if CANNOT_COPY_MARKERS.iter().any(|m| lowered.contains(m)) {
        return PermanentError::CannotCopy(description).into();
    }
    if lowered.contains("message can't be deleted") {
        return PermanentError::CannotDelete(description).into();
    }
    if let Some(field) = too_long_field(&lowered) {
        return PermanentError::TooLong { field, description }.into();
    }
    if lowered.contains("poll") && (lowered.contains("not allowed") || lowered.contains("can't be sent"))
    {
        return PermanentError::PollNotAllowed(description).into();
    }

    // The platform broke on its side
    if (500..600).contains(&code) || lowered.contains("bad gateway") {
        return TransientError::Server { code, description }.into();
    }

    // Account or destination level
    match code {
        401 => FatalError::Unauthorized(description).into(),
        403 => FatalError::Forbidden(description).into(),
        404 => FatalError::EndpointNotFound(description).into(),
        _ if FATAL_MARKERS.iter().any(|m| lowered.contains(m)) => {
            FatalError::ChatNotFound(description).into()
        }
        _ => DeliveryError::Unclassified(format!("{code}: {description}")),
    }
}

/// Classify a raw platform failure.
///
/// The rules are checked in order: rate-limit signal, permanent rejection,
/// transient failure, fatal condition. Anything left over is unclassified.
impl From<PlatformError> for DeliveryError {
    fn from(error: PlatformError) -> Self {
        match error {
            PlatformError::Api {
                code,
                description,
                retry_after,
            } => classify_api(code, description, retry_after),
            PlatformError::Network(msg) => TransientError::Network(msg).into(),
            PlatformError::Timeout(msg) => TransientError::Timeout(msg).into(),
            PlatformError::Decode(msg) => Self::Unclassified(format!("malformed response: {msg}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(code: u16, description: &str) -> DeliveryError {
        PlatformError::api(code, description).into()
    }

    #[test]
    fn test_retry_after_parameter_wins() {
        let err: DeliveryError = PlatformError::Api {
            code: 429,
            description: "Too Many Requests: retry after 17".to_string(),
            retry_after: Some(15),
        }
        .into();
        assert_eq!(err, DeliveryError::RateLimited(15));
    }

    #[test]
    fn test_retry_after_in_description() {
        assert_eq!(
            classify(400, "Flood control exceeded. Retry after 42 seconds"),
            DeliveryError::RateLimited(42)
        );
    }

    #[test]
    fn test_bare_429_waits_one_second() {
        assert_eq!(classify(429, "Too Many Requests"), DeliveryError::RateLimited(1));
    }

    #[test]
    fn test_not_found_is_permanent() {
        let err = classify(400, "Bad Request: message to copy not found");
        assert!(matches!(err, DeliveryError::Permanent(PermanentError::NotFound(_))));
    }

    #[test]
    fn test_cannot_copy_is_permanent() {
        let err = classify(400, "Bad Request: message can't be copied");
        assert!(matches!(err, DeliveryError::Permanent(PermanentError::CannotCopy(_))));
    }

    #[test]
    fn test_too_long_fields() {
        let question = classify(400, "Bad Request: poll question length must not exceed 300");
        assert!(matches!(
            question,
            DeliveryError::Permanent(PermanentError::TooLong {
                field: TextField::Question,
                ..
            })
        ));

        let explanation = classify(400, "Bad Request: explanation is too long");
        assert!(matches!(
            explanation,
            DeliveryError::Permanent(PermanentError::TooLong {
                field: TextField::Explanation,
                ..
            })
        ));

        let text = classify(400, "Bad Request: message is too long");
        assert!(matches!(
            text,
            DeliveryError::Permanent(PermanentError::TooLong {
                field: TextField::Text,
                ..
            })
        ));
    }

    #[test]
    fn test_server_errors_are_transient() {
        assert!(matches!(
            classify(502, "Bad Gateway"),
            DeliveryError::Transient(TransientError::Server { code: 502, .. })
        ));
        assert!(matches!(
            DeliveryError::from(PlatformError::Network("connection reset".to_string())),
            DeliveryError::Transient(_)
        ));
        assert!(matches!(
            DeliveryError::from(PlatformError::Timeout("30s".to_string())),
            DeliveryError::Transient(_)
        ));
    }

    #[test]
    fn test_account_problems_are_fatal() {
        assert!(matches!(classify(401, "Unauthorized"), DeliveryError::Fatal(_)));
        assert!(matches!(
            classify(403, "Forbidden: bot was kicked from the channel chat"),
            DeliveryError::Fatal(_)
        ));
        assert!(matches!(classify(404, "Not Found"), DeliveryError::Fatal(_)));
        assert!(matches!(
            classify(400, "Bad Request: chat not found"),
            DeliveryError::Fatal(FatalError::ChatNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_is_unclassified() {
        let err = classify(400, "Bad Request: something nobody expected");
        assert!(matches!(err, DeliveryError::Unclassified(_)));
    }

    #[test]
    fn test_decode_is_unclassified() {
        let err: DeliveryError = PlatformError::Decode("expected value".to_string()).into();
        assert!(matches!(err, DeliveryError::Unclassified(_)));
    }
}
