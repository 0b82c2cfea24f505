//! JSON item files

use herald_common::{ItemKind, ItemList, PollItem};

/// A JSON array of `{question, options, correct_option?, explanation?}`
///
/// # Errors
/// If `text` is not such an array
pub fn questions(label: &str, text: &str) -> Result<ItemList, serde_json::Error> {
    let polls: Vec<PollItem> = serde_json::from_str(text)?;
    Ok(ItemList::new(label, polls.into_iter().map(ItemKind::Poll)))
}

/// A JSON array of items, each tagged with `"kind"`: `forward`, `poll`,
/// `message` or `delete`
///
/// # Errors
/// If `text` is not such an array
pub fn records(label: &str, text: &str) -> Result<ItemList, serde_json::Error> {
    let kinds: Vec<ItemKind> = serde_json::from_str(text)?;
    Ok(ItemList::new(label, kinds))
}
