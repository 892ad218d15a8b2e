//! Text normalization and tokenization used by the grader.

use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

/// Normalize text for comparison.
///
/// - Unicode NFKC (full-width letters and digits become ASCII)
/// - Lowercase
/// - Apostrophes removed, other punctuation and symbols become spaces
/// - Whitespace collapsed to single spaces
/// - With `fold_accents`, combining marks are stripped (`café` → `cafe`),
///   except the kana voicing marks, so `ば` stays distinct from `は`
pub fn normalize(input: &str, fold_accents: bool) -> String {
    let composed: String = input.nfkc().collect::<String>().to_lowercase();

    let folded: String = if fold_accents {
        composed
            .nfd()
            .filter(|c| {
                is_kana_voicing_mark(*c) || !unicode_normalization::char::is_combining_mark(*c)
            })
            .nfc()
            .collect()
    } else {
        composed
    };

    let mut out = String::with_capacity(folded.len());
    for c in folded.chars() {
        if is_apostrophe(c) {
            continue;
        }
        if c.is_alphanumeric() || unicode_normalization::char::is_combining_mark(c) {
            out.push(c);
        } else {
            out.push(' ');
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Combining dakuten and handakuten.
fn is_kana_voicing_mark(c: char) -> bool {
    matches!(c, '\u{3099}' | '\u{309A}')
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '\u{2018}' | '`')
}

/// Scripts written without spaces between words: each character is a token.
pub fn is_unspaced_script(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'   // Hiragana
        | '\u{30A0}'..='\u{30FF}' // Katakana
        | '\u{31F0}'..='\u{31FF}' // Katakana phonetic extensions
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
    )
}

/// Split normalized text into comparison tokens.
pub fn tokenize(input: &str, fold_accents: bool) -> Vec<String> {
    let normalized = normalize(input, fold_accents);
    let mut tokens = Vec::new();

    for word in normalized.split(' ') {
        let mut current = String::new();
        for c in word.chars() {
            if is_unspaced_script(c) {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }

    tokens
}

/// Deduplicated, ordered token set.
pub fn token_set(input: &str, fold_accents: bool) -> BTreeSet<String> {
    tokenize(input, fold_accents).into_iter().collect()
}

/// Normalized text with all whitespace removed.
pub fn compact(input: &str, fold_accents: bool) -> String {
    normalize(input, fold_accents).replace(' ', "")
}
