//! Text folding for accent- and case-insensitive matching.
//!
//! Official source names, place names, and queries are compared in a folded
//! form: lowercase, with the diacritics used across Iberian languages
//! stripped. "Boletín Oficial de la Junta de Andalucía" and
//! "boletin oficial de la junta de andalucia" fold to the same string.

use std::collections::BTreeSet;

/// Words too common to carry signal when scoring token overlap.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "what", "which", "are", "los", "las",
    "del", "por", "para", "con", "una", "que", "como", "cual", "sobre", "segun", "entre",
];

/// Fold a string to lowercase ASCII-ish form for matching.
///
/// Ordinal markers (º, ª) and non-Latin characters pass through unchanged so
/// that pinpoint locators like "12º" keep their shape.
pub fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Split folded text into distinct content tokens (longer than two characters,
/// not a stopword).
pub fn tokens(s: &str) -> BTreeSet<String> {
    fold(s)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Whether `needle` occurs in `haystack` as a whole phrase (both already folded).
///
/// Phrase boundaries are non-alphanumeric characters or the ends of the string.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();
        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = begin + needle.chars().next().map_or(1, char::len_utf8);
    }
    false
}
