//! Sentence-level de-duplication of model output.

use std::collections::HashSet;

const SEPARATOR: &str = ". ";

/// Drops repeated `". "`-separated sentences, keeping first occurrences in order.
///
/// The closing period of the text is set aside before splitting so the last
/// sentence compares equal to an earlier copy, then restored.
pub fn dedup_sentences(text: &str) -> String {
    let (body, closing) = match text.strip_suffix('.') {
        Some(body) => (body, "."),
        None => (text, ""),
    };

    let mut seen = HashSet::new();
    let kept = body
        .split(SEPARATOR)
        .filter(|s| seen.insert(*s))
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    kept + closing
}
