//! Escaping words back into configuration text
//!
//! The escaper is the inverse of the lexer: a word that scans as a single
//! bare-text run is written as-is, anything else is single-quoted.

use crate::config::Config;
use crate::lexer::BARE_TEXT;

/// Returns `word` escaped as a single configuration word
pub fn escape(word: &str) -> String {
    if is_bare_word(word) {
        word.to_owned()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Returns `words` as a line of escaped words separated by single spaces
pub fn escape_line<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|word| escape(word.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns true when `word` needs no quoting
///
/// This only looks at the word itself. A bare `.` or `NAME=value` written
/// as the first word of a line is read back as a directive or an
/// assignment.
pub fn is_bare_word(word: &str) -> bool {
    BARE_TEXT
        .find(word)
        .is_some_and(|m| m.start() == 0 && m.end() == word.len())
}

/// Serializes `config` as loadable text
///
/// Variables come first, sorted by name, then the plain lines in order.
/// The result has no trailing newline.
pub fn serialize(config: &dyn Config) -> String {
    let mut names = config.variables();
    names.sort();

    let mut pieces = Vec::with_capacity(names.len() + config.len());
    for name in &names {
        let values = config.get(name).unwrap_or_default();
        pieces.push(format!("{} = {}", name, escape_line(values)));
    }
    for line in config.lines() {
        pieces.push(escape_line(line));
    }
    pieces.join("\n")
}
