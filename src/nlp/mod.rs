pub mod embedding;
pub mod sentences;
pub mod stopwords;
pub mod tagger;
pub mod tfidf;

use std::collections::HashMap;

/// Top `n` items by count. Ties keep first-seen order.
pub fn rank_by_frequency<I>(items: I, n: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (i, item) in items.into_iter().enumerate() {
        counts.entry(item).or_insert((0, i)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(item, (count, first))| (item, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(n).map(|(item, _, _)| item).collect()
}

/// Cut `text` to `max_chars` characters, ending in "..." when shortened.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Largest prefix of `text` no longer than `max_bytes`, on a char boundary.
pub(crate) fn prefix_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Suffix of `text` no longer than `max_bytes`, on a char boundary.
pub(crate) fn suffix_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_rank_by_frequency_orders_by_count_then_first_seen() {
        let words = owned(&["beta", "alpha", "gamma", "alpha", "beta", "delta", "alpha"]);
        assert_eq!(rank_by_frequency(words, 3), owned(&["alpha", "beta", "gamma"]));
    }

    #[test]
    fn test_rank_by_frequency_short_input() {
        assert_eq!(rank_by_frequency(owned(&["one"]), 3), owned(&["one"]));
        assert!(rank_by_frequency(Vec::new(), 3).is_empty());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 50), "short");
        let long = "x".repeat(60);
        let cut = truncate_chars(&long, 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_byte_slices_respect_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(prefix_bytes(text, 2), "h");
        assert_eq!(suffix_bytes(text, 4), "rld");
        assert_eq!(prefix_bytes(text, 100), text);
    }
}
