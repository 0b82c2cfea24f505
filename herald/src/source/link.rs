//! `t.me` message links
//!
//! Two shapes are understood:
//! - `t.me/<username>/<id>` for public channels and groups
//! - `t.me/c/<internal>/<id>` for private ones, whose chat id is `-100<internal>`

use herald_common::ChatRef;
use regex::Regex;

use super::SourceError;

const LINK_PATTERN: &str = r"(?:https?://)?t\.me/(c/)?([A-Za-z0-9_]+)/([0-9]+)";

/// One message, as addressed by a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLink {
    pub chat: ChatRef,
    pub message_id: i64,
}

fn pattern() -> Result<Regex, SourceError> {
    Ok(Regex::new(LINK_PATTERN)?)
}

fn from_parts(private: bool, chat: &str, id: &str, link: &str) -> Result<MessageLink, SourceError> {
    let invalid = || SourceError::InvalidLink(link.to_string());

    let chat = if private || chat.bytes().all(|b| b.is_ascii_digit()) {
        chat.parse()
            .ok()
            .and_then(ChatRef::from_internal_id)
            .ok_or_else(invalid)?
    } else {
        ChatRef::username(chat).map_err(|_| invalid())?
    };

    Ok(MessageLink {
        chat,
        message_id: id.parse().map_err(|_| invalid())?,
    })
}

/// Every link in `text`, in the order they appear
///
/// # Errors
/// If a link names an impossible chat or message id
pub fn find_all(text: &str) -> Result<Vec<MessageLink>, SourceError> {
    pattern()?
        .captures_iter(text)
        .map(|caps| {
            from_parts(
                caps.get(1).is_some(),
                &caps[2],
                &caps[3],
                caps.get(0).map_or("", |m| m.as_str()),
            )
        })
        .collect()
}

/// The first link in `text`
///
/// # Errors
/// If `text` contains no usable link
pub fn parse(text: &str) -> Result<MessageLink, SourceError> {
    find_all(text)?
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::InvalidLink(text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_public_link() {
        assert_eq!(
            parse("https://t.me/some_channel/456").unwrap(),
            MessageLink {
                chat: ChatRef::Username("@some_channel".to_string()),
                message_id: 456,
            }
        );
    }

    #[test]
    fn test_private_link() {
        assert_eq!(
            parse("t.me/c/123456789/42").unwrap(),
            MessageLink {
                chat: ChatRef::Id(-100_123_456_789),
                message_id: 42,
            }
        );
    }

    #[test]
    fn test_links_in_free_text() {
        let links = find_all(
            "first: https://t.me/news/100\nand then http://t.me/news/105 (end)",
        )
        .unwrap();

        assert_eq!(
            links.iter().map(|l| l.message_id).collect::<Vec<_>>(),
            vec![100, 105]
        );
    }

    #[test]
    fn test_not_a_link() {
        assert!(matches!(
            parse("https://example.com/news/1"),
            Err(SourceError::InvalidLink(_))
        ));
    }
}
