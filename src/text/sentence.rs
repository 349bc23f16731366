//! Punctuation-based sentence splitting

use crate::text::Keyword;
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence terminator followed by the whitespace run that ends the sentence
static BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Splits a block of text into sentences
///
/// A boundary is any `.`, `!` or `?` followed by whitespace. The terminator
/// stays with the sentence it ends and the whitespace is dropped. There is no
/// handling of abbreviations, so "e.g. this" splits after "e.g.".
///
/// Each sentence is trimmed, and empty pieces are discarded, so empty or
/// whitespace-only input yields an empty vector.
///
/// # Example
///
/// ```
/// use paper_sieve::text::split_sentences;
///
/// let sentences = split_sentences("One. Two!  Three?");
/// assert_eq!(sentences, vec!["One.", "Two!", "Three?"]);
/// ```
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in BOUNDARY.find_iter(text) {
        // Terminators are ASCII, so the sentence ends one byte past the match start
        let end = boundary.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

/// Returns the first sentence of `text` that matches `keyword`
///
/// Sentences are visited in [`split_sentences`] order. Returns `None` when no
/// sentence matches.
pub fn find_sentence_with_keyword(text: &str, keyword: &Keyword) -> Option<String> {
    split_sentences(text)
        .into_iter()
        .find(|sentence| keyword.is_match(sentence))
}
