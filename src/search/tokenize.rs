//! Text tokenization shared by index building and query execution.
//!
//! Indexed text and query text go through the same splitter so that a query
//! term and an indexed term compare on equal footing: lowercase, split on
//! whitespace and punctuation, no stemming. Prefix and fuzzy expansion at
//! query time take the place of stemming.

/// Returns true for characters that separate terms.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation() || is_unicode_punctuation(c)
}

/// Common non-ASCII punctuation that shows up in extracted manual text.
fn is_unicode_punctuation(c: char) -> bool {
    matches!(
        c,
        '\u{2010}'..='\u{2027}' | '\u{00A0}' | '\u{00AB}' | '\u{00BB}' | '\u{00B7}' | '\u{2030}'..='\u{205E}'
    )
}

/// Splits text into lowercase terms.
///
/// - "Fuel Pump Relay" → ["fuel", "pump", "relay"]
/// - "A/C Compressor" → ["a", "c", "compressor"]
/// - "P0171" → ["p0171"]
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(is_separator)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Number of whitespace-separated terms in a raw query.
///
/// This is what decides AND vs OR combination, so it deliberately counts the
/// query the way the user typed it rather than the tokenized form.
pub(crate) fn whitespace_term_count(query: &str) -> usize {
    query.split_whitespace().count()
}
