//! Message-id ranges given as pairs of links

use herald_common::{ChatRef, DeleteEntry, ForwardEntry, ItemKind, ItemList, internal};

use super::{SourceError, link};

/// Number of messages from `start` to `end`, both included
fn span(start: i64, end: i64, max: u64) -> Result<(), SourceError> {
    let span = end.abs_diff(start).saturating_add(1);
    if span > max {
        return Err(SourceError::RangeTooLarge { span, max });
    }
    Ok(())
}

/// One item per message id between the first two links in `text`
///
/// The links may come in either order; both ends are included.
///
/// # Errors
/// If there are fewer than two links, they point into different chats or the
/// range covers more than `max_span` messages
pub fn forward(label: &str, text: &str, max_span: u64) -> Result<ItemList, SourceError> {
    let links = link::find_all(text)?;
    let [first, second, ..] = links.as_slice() else {
        return Err(SourceError::TooFewLinks(links.len()));
    };

    if first.chat != second.chat {
        return Err(SourceError::MixedChats {
            first: first.chat.clone(),
            second: second.chat.clone(),
        });
    }

    let start = first.message_id.min(second.message_id);
    let end = first.message_id.max(second.message_id);
    span(start, end, max_span)?;
    internal!(level = INFO, "Forward range {} [{start}..={end}]", first.chat);

    Ok(ItemList::new(
        label,
        (start..=end).map(|message_id| {
            ItemKind::ForwardRangeEntry(ForwardEntry {
                source_chat: first.chat.clone(),
                message_id,
            })
        }),
    ))
}

fn bound<'a>(text: &'a str, name: &'static str) -> Result<&'a str, SourceError> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix(name)?.trim_start().strip_prefix('='))
        .map(str::trim)
        .ok_or(SourceError::MissingBound(name))
}

/// One delete per message id from the `START=` link to the `END=` link
///
/// Public `t.me/<name>` links delete from `chat` when one is given.
///
/// # Errors
/// If a bound is missing or malformed, the bounds point into different chats
/// or the range covers more than `max_span` messages
pub fn delete(
    label: &str,
    text: &str,
    chat: Option<&ChatRef>,
    max_span: u64,
) -> Result<ItemList, SourceError> {
    let start = link::parse(bound(text, "START")?)?;
    let end = link::parse(bound(text, "END")?)?;

    if start.chat != end.chat {
        return Err(SourceError::MixedChats {
            first: start.chat,
            second: end.chat,
        });
    }

    let target = match (&start.chat, chat) {
        (ChatRef::Username(_), Some(chat)) => chat.clone(),
        (link_chat, _) => link_chat.clone(),
    };

    let first = start.message_id.min(end.message_id);
    let last = start.message_id.max(end.message_id);
    span(first, last, max_span)?;
    internal!(level = INFO, "Delete range {target} [{first}..={last}]");

    Ok(ItemList::new(
        label,
        (first..=last).map(|message_id| {
            ItemKind::DeleteEntry(DeleteEntry {
                chat: target.clone(),
                message_id,
            })
        }),
    ))
}
