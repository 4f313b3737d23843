//! Shell-like lexer and word splitter
//!
//! The lexer is a state machine over a [`Scanner`]. Each [`State`] consumes
//! a piece of input and either adds text to the word being built, closes
//! the word, expands a variable, or closes the logical line. Closing a line
//! applies the line's [`PendingOperation`] to the configuration.
//!
//! Quoting follows POSIX `sh` closely:
//!
//! - `'...'` is literal, newlines included, with no escapes
//! - `"..."` keeps whitespace, and still expands `$NAME` and honours `\`
//! - `\x` makes any character literal; backslash-newline joins lines
//! - `#` starts a comment that runs to the end of the line
//!
//! `$NAME` outside double quotes splits a multi-valued variable into
//! several words. Inside double quotes the values are joined with a space,
//! or with the glue given as `${NAME|glue}`.

use crate::directive::PendingOperation;
use crate::error::{LexError, Location, ShlikeError};
use crate::expand::{self, Expansion, VariableReference};
use crate::loader::Evaluator;
use crate::scanner::Scanner;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

/// Optional assignment prefix at the start of a line
static BEGIN_OF_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[^\S\r\n]|\r?\n)*(?:([_\p{L}][_\p{L}\p{N}]*)[\t\x0B\x0C ]*([?+]?)=[\t\x0B\x0C ]*)?").unwrap()
});

/// Unquoted text run; also the grammar of words that need no escaping
pub(crate) static BARE_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[^\\'"$#\s]+"#).unwrap());

static QUOTED_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[^\\"$]+"#).unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[^\S\r\n]|\\\r?\n)+").unwrap());

static BACKSLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\\(\r?\n|.)").unwrap());

static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'([^']*)'").unwrap());

static VARIABLE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$(?:([-0-9#!$%&*+,.:;<=>?@^_/|~])|([_\p{L}][_\p{L}\p{N}]*)|\{(?s:(.*?))\})")
        .unwrap()
});

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\r?\n)+").unwrap());

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[^\n]*(?:\r?\n)*").unwrap());

/// Scanning states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeginOfLine,
    Dispatch,
    BareText,
    QuotedText,
    WhiteSpace,
    Backslash,
    SingleQuoted,
    DoubleQuote,
    VariableReference,
    Comment,
    LineBreak,
    Finish,
}

/// Lexer for one source text
///
/// Holds the scan cursor and everything that lives for one logical line:
/// the quote flag, the word and line accumulators, and the pending
/// operation.
pub(crate) struct Lexer<'a, 'e, 'c> {
    name: &'a str,
    scanner: Scanner<'a>,
    eval: &'e mut Evaluator<'c>,
    in_double_quotes: bool,
    quote_start: usize,
    word: Option<String>,
    line: SmallVec<[String; 8]>,
    line_start: Option<usize>,
    pending: PendingOperation,
}

impl<'a, 'e, 'c> Lexer<'a, 'e, 'c> {
    pub(crate) fn new(eval: &'e mut Evaluator<'c>, name: &'a str, text: &'a str) -> Self {
        Self {
            name,
            scanner: Scanner::new(text),
            eval,
            in_double_quotes: false,
            quote_start: 0,
            word: None,
            line: SmallVec::new(),
            line_start: None,
            pending: PendingOperation::Plain,
        }
    }

    /// Runs the state machine to the end of input or the first error
    pub(crate) fn run(mut self) -> Result<(), ShlikeError> {
        let mut state = State::BeginOfLine;
        while let Some(next) = self.step(state)? {
            state = next;
        }
        Ok(())
    }

    fn step(&mut self, state: State) -> Result<Option<State>, ShlikeError> {
        let next = match state {
            State::BeginOfLine => self.begin_of_line(),
            State::Dispatch => self.dispatch()?,
            State::BareText => self.text(&BARE_TEXT, "bare text")?,
            State::QuotedText => self.text(&QUOTED_TEXT, "double quoted text")?,
            State::WhiteSpace => self.whitespace()?,
            State::Backslash => self.backslash()?,
            State::SingleQuoted => self.single_quoted()?,
            State::DoubleQuote => self.double_quote(),
            State::VariableReference => self.variable_reference()?,
            State::Comment => self.end_of_line(&COMMENT)?,
            State::LineBreak => self.end_of_line(&LINE_BREAK)?,
            State::Finish => {
                self.end_line()?;
                return Ok(None);
            }
        };
        Ok(Some(next))
    }

    fn location_at(&self, offset: usize) -> Location {
        Location {
            source: self.name.to_owned(),
            position: self.scanner.position_of(offset),
        }
    }

    fn here(&self) -> Location {
        self.location_at(self.scanner.offset())
    }

    fn begin_of_line(&mut self) -> State {
        // Every part of the pattern is optional, so it always matches.
        if let Some(captures) = self.scanner.match_at(&BEGIN_OF_LINE) {
            if let Some(name) = captures.get(1) {
                let operator = captures.get(2).map_or("", |m| m.as_str());
                self.pending = PendingOperation::assignment(name.as_str(), operator);
            }
        }
        self.scanner.consume_lexeme();
        if self.pending.is_plain() && self.scanner.peek() == Some('.') {
            self.pending = PendingOperation::Directive;
        }
        State::Dispatch
    }

    fn dispatch(&self) -> Result<State, LexError> {
        let next = self.scanner.peek();
        if self.in_double_quotes {
            return match next {
                Some('\\') => Ok(State::Backslash),
                Some('$') => Ok(State::VariableReference),
                Some('"') => Ok(State::DoubleQuote),
                Some(_) => Ok(State::QuotedText),
                None => Err(LexError::UnterminatedDoubleQuote {
                    location: self.location_at(self.quote_start),
                }),
            };
        }
        Ok(match next {
            Some('\r' | '\n') => State::LineBreak,
            Some('\\') => State::Backslash,
            Some('#') => State::Comment,
            Some('$') => State::VariableReference,
            Some('\'') => State::SingleQuoted,
            Some('"') => State::DoubleQuote,
            Some(c) if c.is_whitespace() => State::WhiteSpace,
            Some(_) => State::BareText,
            None => State::Finish,
        })
    }

    fn text(&mut self, pattern: &Regex, what: &'static str) -> Result<State, LexError> {
        if self.scanner.match_at(pattern).is_none() {
            return Err(LexError::Invalid {
                what,
                location: self.here(),
            });
        }
        self.mark_line_start();
        let text = self.scanner.consume_lexeme();
        self.add_text(text);
        Ok(State::Dispatch)
    }

    fn whitespace(&mut self) -> Result<State, LexError> {
        if self.scanner.match_at(&WHITESPACE).is_none() {
            return Err(LexError::Invalid {
                what: "whitespace",
                location: self.here(),
            });
        }
        self.scanner.consume_lexeme();
        self.end_word();
        Ok(State::Dispatch)
    }

    fn backslash(&mut self) -> Result<State, LexError> {
        let Some(captures) = self.scanner.match_at(&BACKSLASH) else {
            return Err(LexError::DanglingBackslash {
                location: self.here(),
            });
        };
        let escaped = captures.get(1).map_or("", |m| m.as_str());
        if escaped.ends_with('\n') {
            // Escaped line break: nothing inside double quotes, a word
            // separator outside.
            if !self.in_double_quotes {
                self.end_word();
            }
        } else {
            self.mark_line_start();
            self.add_text(escaped);
        }
        self.scanner.consume_lexeme();
        Ok(State::Dispatch)
    }

    fn single_quoted(&mut self) -> Result<State, LexError> {
        let Some(captures) = self.scanner.match_at(&SINGLE_QUOTED) else {
            return Err(LexError::UnterminatedSingleQuote {
                location: self.here(),
            });
        };
        self.mark_line_start();
        self.add_text(captures.get(1).map_or("", |m| m.as_str()));
        self.scanner.consume_lexeme();
        Ok(State::Dispatch)
    }

    fn double_quote(&mut self) -> State {
        let start = self.scanner.offset();
        self.scanner.advance();
        if !self.in_double_quotes && self.scanner.advance() == Some('"') {
            // `""` outside quotes is an explicit empty string
            self.mark_line_start();
            self.add_text("");
        } else {
            if !self.in_double_quotes {
                self.scanner.retreat();
            }
            self.in_double_quotes = !self.in_double_quotes;
            self.quote_start = start;
        }
        self.scanner.consume_lexeme();
        State::Dispatch
    }

    fn variable_reference(&mut self) -> Result<State, ShlikeError> {
        let start = self.scanner.offset();
        let Some(captures) = self.scanner.match_at(&VARIABLE_REFERENCE) else {
            return Err(LexError::InvalidVariableReference {
                location: self.here(),
            }
            .into());
        };
        let reference = if let Some(body) = captures.get(3) {
            VariableReference::braced(body.as_str())
        } else {
            let name = captures.get(1).or_else(|| captures.get(2));
            VariableReference::plain(name.map_or("", |m| m.as_str()))
        };
        self.scanner.consume_lexeme();

        match expand::expand(self.eval.config(), &reference, self.in_double_quotes) {
            Expansion::Undefined => {
                let location = self.location_at(start);
                self.eval.undefined_variable(reference.name, location)?;
            }
            Expansion::Joined(text) => {
                self.line_start.get_or_insert(start);
                self.add_text(&text);
            }
            Expansion::Words(words) => {
                self.end_word();
                self.line_start.get_or_insert(start);
                self.line.extend(words);
            }
        }
        Ok(State::Dispatch)
    }

    /// Consumes a comment or line break run and closes the line
    fn end_of_line(&mut self, pattern: &Regex) -> Result<State, ShlikeError> {
        // A comment always matches; only a lone `\r` gets here.
        if self.scanner.match_at(pattern).is_none() {
            return Err(LexError::InvalidLineBreak {
                location: self.here(),
            }
            .into());
        }
        self.scanner.consume_lexeme();
        self.end_line()?;
        Ok(State::BeginOfLine)
    }

    fn mark_line_start(&mut self) {
        let start = self.scanner.start();
        self.line_start.get_or_insert(start);
    }

    fn add_text(&mut self, text: &str) {
        self.word.get_or_insert_with(String::new).push_str(text);
    }

    fn end_word(&mut self) {
        if let Some(word) = self.word.take() {
            self.line.push(word);
        }
    }

    /// Closes the logical line and applies its pending operation
    fn end_line(&mut self) -> Result<(), ShlikeError> {
        self.end_word();
        let words = std::mem::take(&mut self.line).into_vec();
        let line_start = self.line_start.take();
        let pending = std::mem::take(&mut self.pending);

        if let Some(words) = pending.apply(self.eval.config_mut(), words) {
            let location = self.location_at(line_start.unwrap_or(self.scanner.start()));
            self.eval.run_directive(self.name, &words, location)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, SimpleConfig};
    use crate::error::Warning;

    fn parse(source: &str) -> SimpleConfig {
        let mut config = SimpleConfig::new();
        config.eval(source).unwrap();
        config
    }

    fn lines(config: &SimpleConfig) -> Vec<Vec<String>> {
        config.all_lines().to_vec()
    }

    #[test]
    fn test_smoke() {
        let config = parse("\nfoo bar\nbaz\nquux\ntony halik\n");
        assert_eq!(
            lines(&config),
            vec![
                vec!["foo", "bar"],
                vec!["baz"],
                vec!["quux"],
                vec!["tony", "halik"],
            ]
        );
    }

    #[test]
    fn test_quoting_and_escaping() {
        let config = parse(
            r#"
Tony\ Halik 'Tony Halik' "Tony Halik" \
\T'o'"n"y' H'alik
'$tota#lly' \$what\$0\#\"ever\' '"' "'"
'foo
bar' "baz
quux" "xy\
zzy" 'what\
ever'
"#,
        );
        assert_eq!(
            lines(&config),
            vec![
                vec!["Tony Halik", "Tony Halik", "Tony Halik", "Tony Halik"],
                vec!["$tota#lly", "$what$0#\"ever'", "\"", "'"],
                vec!["foo\nbar", "baz\nquux", "xyzzy", "what\\\never"],
            ]
        );
    }

    #[test]
    fn test_crlf_line_breaks() {
        let config = parse("cr\r\nlf\\\r\n\"cr\\\r\nlf\"");
        assert_eq!(lines(&config), vec![vec!["cr"], vec!["lf", "crlf"]]);
    }

    #[test]
    fn test_empty_strings() {
        let config = parse("Tony Hal\"\"ik '' Tony\\ Ha''lik \"\" ");
        assert_eq!(
            lines(&config),
            vec![vec!["Tony", "Halik", "", "Tony Halik", ""]]
        );
    }

    #[test]
    fn test_comments() {
        let config = parse("Tony Halik # tu byłem\n# whole line\nnext");
        assert_eq!(lines(&config), vec![vec!["Tony", "Halik"], vec!["next"]]);
    }

    #[test]
    fn test_hash_inside_word_starts_comment() {
        let config = parse("foo#bar baz");
        assert_eq!(lines(&config), vec![vec!["foo"]]);
    }

    #[test]
    fn test_empty_and_blank_input() {
        for source in ["", "   ", "\n\n\t\n", "# only a comment\n"] {
            let config = parse(source);
            assert!(config.is_empty(), "source {source:?}");
            assert!(config.variables().is_empty(), "source {source:?}");
        }
    }

    #[test]
    fn test_assignments() {
        let mut config = SimpleConfig::new();
        config.set("FOO", vec!["Foo".into()]);
        config.set("BAR", vec!["Bar".into()]);
        config.set("BAZ", vec!["Baz".into()]);
        config
            .eval("FOO = Tony Halik\nBAR ?= Tony Halik\nBAZ += Quux\nQUUX = Quux\nEMPTY =\n")
            .unwrap();

        assert_eq!(config.get("FOO").unwrap(), ["Tony", "Halik"]);
        assert_eq!(config.get("BAR").unwrap(), ["Bar"]);
        assert_eq!(config.get("BAZ").unwrap(), ["Baz", "Quux"]);
        assert_eq!(config.get("QUUX").unwrap(), ["Quux"]);
        assert_eq!(config.get("EMPTY"), Some(&[][..]));
        assert!(config.is_empty());
    }

    #[test]
    fn test_assignment_without_spaces_and_indentation() {
        let config = parse("  X=a\n\tY+=b\nZ?=\"c d\"");
        assert_eq!(config.get("X").unwrap(), ["a"]);
        assert_eq!(config.get("Y").unwrap(), ["b"]);
        assert_eq!(config.get("Z").unwrap(), ["c d"]);
    }

    #[test]
    fn test_assignment_only_at_line_start() {
        let config = parse("echo X = 1");
        assert_eq!(lines(&config), vec![vec!["echo", "X", "=", "1"]]);
        assert!(config.get("X").is_none());
    }

    #[test]
    fn test_variable_expansion() {
        let mut config = SimpleConfig::new();
        config.set("FOO", vec!["Tony".into(), "Halik".into()]);
        config
            .eval(
                r#"$FOO "$FOO" '$FOO' ${FOO} "${FOO}" '${FOO}' tu${FOO}byłem "tu${FOO}byłem" tam$FOO-też "tam$FOO-też""#,
            )
            .unwrap();
        assert_eq!(
            lines(&config),
            vec![vec![
                "Tony",
                "Halik",
                "Tony Halik",
                "$FOO",
                "Tony",
                "Halik",
                "Tony Halik",
                "${FOO}",
                "tu",
                "Tony",
                "Halik",
                "byłem",
                "tuTony Halikbyłem",
                "tam",
                "Tony",
                "Halik",
                "-też",
                "tamTony Halik-też",
            ]]
        );
    }

    #[test]
    fn test_custom_glue() {
        let mut config = SimpleConfig::new();
        config.set("FOO", vec!["Tony".into(), "Halik".into()]);
        config.eval("\"${FOO|+}\" \"${FOO|}\" \"${FOO|, }\"").unwrap();
        assert_eq!(
            lines(&config),
            vec![vec!["Tony+Halik", "TonyHalik", "Tony, Halik"]]
        );
    }

    #[test]
    fn test_expansion_is_not_rescanned() {
        let mut config = SimpleConfig::new();
        config.set("A", vec!["$B".into(), "'q'".into()]);
        config.set("B", vec!["nope".into()]);
        config.eval("$A \"$A\"").unwrap();
        assert_eq!(lines(&config), vec![vec!["$B", "'q'", "$B 'q'"]]);
    }

    #[test]
    fn test_assignment_uses_earlier_values() {
        let config = parse("X = a b\nX += c\nY = $X \"$X\"\n");
        assert_eq!(config.get("X").unwrap(), ["a", "b", "c"]);
        assert_eq!(config.get("Y").unwrap(), ["a", "b", "c", "a b c"]);
    }

    #[test]
    fn test_single_character_reference_wins_over_identifier() {
        let mut config = SimpleConfig::new();
        config.set("_", vec!["u".into()]);
        config.set("_NAME", vec!["v".into()]);
        config.set("-", vec!["dash".into()]);
        config.set("0", vec!["zero".into()]);
        let warnings = config.eval("$_NAME $- \"$_NAME\" $0abc ${_NAME}").unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            lines(&config),
            vec![vec!["u", "NAME", "dash", "uNAME", "zero", "abc", "v"]]
        );
    }

    #[test]
    fn test_undefined_variable_warns() {
        let mut config = SimpleConfig::new();
        let warnings = config.eval("a $nope b \"x${nope}y\"").unwrap();
        assert_eq!(lines(&config), vec![vec!["a", "b", "xy"]]);
        assert_eq!(warnings.len(), 2);
        match &warnings[0] {
            Warning::UndefinedVariable { name, location } => {
                assert_eq!(name, "nope");
                assert_eq!(location.line(), 1);
                assert_eq!(location.column(), 3);
            }
        }
    }

    #[test]
    fn test_undefined_variable_alone_produces_no_line() {
        let mut config = SimpleConfig::new();
        let warnings = config.eval("$nope").unwrap();
        assert!(config.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().ends_with("WARNING: Undefined variable \"nope\""));
    }

    #[test]
    fn test_single_quotes_have_no_escapes() {
        let config = parse(r"'a\nb'");
        assert_eq!(lines(&config), vec![vec![r"a\nb"]]);
    }

    #[test]
    fn test_invalid_input() {
        let mut config = SimpleConfig::new();
        assert!(matches!(
            config.eval("'foo"),
            Err(ShlikeError::Lex(LexError::UnterminatedSingleQuote { .. }))
        ));
        assert!(matches!(
            config.eval("\"foo"),
            Err(ShlikeError::Lex(LexError::UnterminatedDoubleQuote { .. }))
        ));
        assert!(matches!(
            config.eval("foo \""),
            Err(ShlikeError::Lex(LexError::UnterminatedDoubleQuote { .. }))
        ));
        assert!(matches!(
            config.eval("fo\ro"),
            Err(ShlikeError::Lex(LexError::InvalidLineBreak { .. }))
        ));
        assert!(matches!(
            config.eval("foo \\"),
            Err(ShlikeError::Lex(LexError::DanglingBackslash { .. }))
        ));
        assert!(matches!(
            config.eval("$ foo"),
            Err(ShlikeError::Lex(LexError::InvalidVariableReference { .. }))
        ));
        assert!(matches!(
            config.eval("${FOO"),
            Err(ShlikeError::Lex(LexError::InvalidVariableReference { .. }))
        ));
    }

    #[test]
    fn test_lone_carriage_return_at_line_start() {
        for source in ["\rfoo", "a\n\rb", "  \r x", "a\r\n\r"] {
            let mut config = SimpleConfig::new();
            assert!(
                matches!(
                    config.eval(source),
                    Err(ShlikeError::Lex(LexError::InvalidLineBreak { .. }))
                ),
                "source {source:?}"
            );
        }
    }

    #[test]
    fn test_crlf_blank_lines_before_assignment() {
        let config = parse("\r\n\r\n  X = 1\r\n\r\ny\r\n");
        assert_eq!(config.get("X").unwrap(), ["1"]);
        assert_eq!(lines(&config), vec![vec!["y"]]);
    }

    #[test]
    fn test_directive_detection_needs_bare_dot() {
        let config = parse("'.include' x\n\\.include y");
        assert_eq!(
            lines(&config),
            vec![vec![".include", "x"], vec![".include", "y"]]
        );
    }

    #[test]
    fn test_dot_inside_line_is_text() {
        let config = parse("run ./script.sh .");
        assert_eq!(lines(&config), vec![vec!["run", "./script.sh", "."]]);
    }
}
