//! Ways to re-create content the platform refused to copy
//!
//! Each strategy looks at the inspected content and either plans a
//! [`Resend`] or declines. Strategies are tried in table order; the engine
//! runs the planned resends until one of them is accepted.

use crate::platform::{Resend, SourceContent};

type Strategy = fn(&SourceContent) -> Option<Resend>;

const STRATEGIES: [(&str, Strategy); 4] = [
    ("text", text_resend),
    ("media", media_resend),
    ("poll", poll_rebuild),
    ("caption", caption_as_text),
];

fn text_resend(content: &SourceContent) -> Option<Resend> {
    match content {
        SourceContent::Text(text) if !text.trim().is_empty() => Some(Resend::Text(text.clone())),
        _ => None,
    }
}

fn media_resend(content: &SourceContent) -> Option<Resend> {
    match content {
        SourceContent::Media(media) => {
            let mut media = media.clone();
            if !media.kind.has_caption() {
                media.caption = None;
            }
            Some(Resend::Media(media))
        }
        _ => None,
    }
}

fn poll_rebuild(content: &SourceContent) -> Option<Resend> {
    match content {
        SourceContent::Poll(poll) if poll.options.len() >= 2 => Some(Resend::Poll(poll.clone())),
        _ => None,
    }
}

fn caption_as_text(content: &SourceContent) -> Option<Resend> {
    match content {
        SourceContent::Media(media) => media
            .caption
            .as_ref()
            .filter(|caption| !caption.trim().is_empty())
            .map(|caption| Resend::Text(caption.clone())),
        _ => None,
    }
}

/// Every applicable resend for `content`, in the order to try them
pub fn plan(content: &SourceContent) -> Vec<(&'static str, Resend)> {
    STRATEGIES
        .iter()
        .filter_map(|(name, strategy)| strategy(content).map(|resend| (*name, resend)))
        .collect()
}
