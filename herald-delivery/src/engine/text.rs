//! Length handling for outgoing text
//!
//! Local limits are counted in characters. The platform counts some limits in
//! UTF-16 code units, which is what the `utf16` variants are for when a
//! rejection has to be repaired.

/// Cut `text` to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Cut `text` to at most `max` UTF-16 code units without splitting a character
pub fn truncate_utf16(text: &str, max: usize) -> String {
    let mut units = 0;
    let mut end = 0;

    for (offset, c) in text.char_indices() {
        units += c.len_utf16();
        if units > max {
            break;
        }
        end = offset + c.len_utf8();
    }

    text[..end].to_string()
}

/// Split `text` into chunks of at most `max` characters
///
/// A chunk ends right after the last newline inside its window when there is
/// one, otherwise it is cut hard at `max`. Blank chunks are dropped.
pub fn chunk(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while let Some((window_end, _)) = rest.char_indices().nth(max) {
        let split = match rest[..window_end].rfind('\n') {
            Some(newline) if newline > 0 => newline + 1,
            _ => window_end,
        };

        chunks.push(&rest[..split]);
        rest = &rest[split..];
    }
    chunks.push(rest);

    chunks
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars(&"x".repeat(250), 195).chars().count(), 195);
    }

    #[test]
    fn test_truncate_utf16_keeps_surrogate_pairs_whole() {
        // Each emoji is two UTF-16 units
        assert_eq!(truncate_utf16("😀😀😀", 5), "😀😀");
        assert_eq!(truncate_utf16("abc", 3), "abc");
        assert_eq!(truncate_utf16("abc", 0), "");
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(chunk("hello", 4096), vec!["hello".to_string()]);
    }

    #[test]
    fn test_chunks_prefer_newlines() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(
            chunk(text, 10),
            vec!["aaaa\nbbbb\n".to_string(), "cccc".to_string()]
        );
    }

    #[test]
    fn test_chunks_cut_hard_without_newline() {
        let text = "x".repeat(9000);
        let chunks = chunk(&text, 4096);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 4096);
        assert_eq!(chunks[1].chars().count(), 4096);
        assert_eq!(chunks[2].chars().count(), 808);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_every_chunk_fits() {
        let text = "line of text\n".repeat(1000);
        assert!(chunk(&text, 4096).iter().all(|c| c.chars().count() <= 4096));
        assert_eq!(chunk(&text, 4096).concat(), text);
    }
}
