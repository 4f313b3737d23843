//! Low-level cursor over source text
//!
//! The scanner tracks two byte offsets: the commit point (`start`) where the
//! lexeme being scanned began, and the cursor (`pos`). Both always sit on
//! `char` boundaries.

use crate::error::Position;
use regex::{Captures, Regex};

/// Cursor over a source string, advancing by code point or by pattern
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    start: usize,
    pos: usize,
    width: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner positioned at the start of `text`
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            start: 0,
            pos: 0,
            width: 0,
        }
    }

    /// Returns the whole source text
    #[inline]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Byte offset of the commit point
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset of the cursor
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Text from the cursor to the end of input
    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Returns the next code point without consuming it
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes and returns the next code point
    pub fn advance(&mut self) -> Option<char> {
        match self.peek() {
            Some(c) => {
                self.width = c.len_utf8();
                self.pos += self.width;
                Some(c)
            }
            None => {
                self.width = 0;
                None
            }
        }
    }

    /// Steps back over the code point or match consumed last
    ///
    /// Only one step is remembered; a second call is a no-op.
    pub fn retreat(&mut self) {
        self.pos = self.pos.saturating_sub(self.width).max(self.start);
        self.width = 0;
    }

    /// Matches a `^`-anchored `pattern` at the cursor
    ///
    /// On success the cursor moves past the whole match and the captures
    /// are returned. On failure the cursor does not move.
    pub fn match_at(&mut self, pattern: &Regex) -> Option<Captures<'a>> {
        let rest = self.rest();
        let captures = pattern.captures(rest)?;
        let whole = captures.get(0)?;
        if whole.start() != 0 {
            return None;
        }
        self.width = whole.end();
        self.pos += whole.end();
        Some(captures)
    }

    /// Returns the text between the commit point and the cursor, and moves
    /// the commit point to the cursor
    pub fn consume_lexeme(&mut self) -> &'a str {
        let lexeme = &self.text[self.start..self.pos];
        self.start = self.pos;
        lexeme
    }

    /// Line and column of a byte offset in the source text
    pub fn position_of(&self, offset: usize) -> Position {
        Position::at_offset(self.text, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_and_advance_unicode() {
        let mut scanner = Scanner::new("zł$");
        assert_eq!(scanner.peek(), Some('z'));
        assert_eq!(scanner.advance(), Some('z'));
        assert_eq!(scanner.advance(), Some('ł'));
        assert_eq!(scanner.offset(), 3);
        assert_eq!(scanner.advance(), Some('$'));
        assert_eq!(scanner.rest(), "");
        assert_eq!(scanner.peek(), None);
        assert_eq!(scanner.advance(), None);
    }

    #[test]
    fn test_retreat_one_step() {
        let mut scanner = Scanner::new("łab");
        scanner.advance();
        scanner.advance();
        scanner.retreat();
        assert_eq!(scanner.offset(), 2);
        assert_eq!(scanner.peek(), Some('a'));

        // Only the last step is remembered
        scanner.retreat();
        assert_eq!(scanner.offset(), 2);
    }

    #[test]
    fn test_match_at_advances_only_on_success() {
        let pattern = Regex::new(r"^([a-z]+)=").unwrap();
        let mut scanner = Scanner::new("key=value");
        let captures = scanner.match_at(&pattern).unwrap();
        assert_eq!(&captures[1], "key");
        assert_eq!(scanner.offset(), 4);

        assert!(scanner.match_at(&pattern).is_none());
        assert_eq!(scanner.offset(), 4);
    }

    #[test]
    fn test_match_at_is_anchored_at_cursor() {
        let pattern = Regex::new(r"^b+").unwrap();
        let mut scanner = Scanner::new("abbb");
        assert!(scanner.match_at(&pattern).is_none());
        scanner.advance();
        scanner.consume_lexeme();
        assert!(scanner.match_at(&pattern).is_some());
        assert_eq!(scanner.consume_lexeme(), "bbb");
    }

    #[test]
    fn test_consume_lexeme() {
        let mut scanner = Scanner::new("foo bar");
        scanner.advance();
        scanner.advance();
        scanner.advance();
        assert_eq!(scanner.consume_lexeme(), "foo");
        assert_eq!(scanner.start(), 3);
        assert_eq!(scanner.consume_lexeme(), "");
    }

    #[test]
    fn test_position_of() {
        let scanner = Scanner::new("ab\ncd\nef");
        let position = scanner.position_of(4);
        assert_eq!(position.line, 2);
        assert_eq!(position.column, 2);
        assert_eq!(position.offset, 4);
    }
}
