// Person-name canonical form, shared by every comparison in the pipeline

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form of a person name: upper-case, no diacritics, single spaces.
///
/// `"  López   Ana "` and `"LOPEZ ANA"` both become `"LOPEZ ANA"`. Total and
/// idempotent; the empty string maps to itself.
pub fn normalize_name(name: &str) -> String {
    // Case first: a few lower-case letters upper-case into a base letter
    // plus a combining mark, which the NFD pass then removes.
    let upper = name.to_uppercase();
    let stripped: String = upper.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// File stem for the per-person document and text files.
///
/// `name` is expected to be normalized already; path separators and other
/// characters that cannot appear in a file name are replaced with `_`.
pub fn sidecar_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim_matches('.').trim();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem.to_string()
    }
}
