//! Error types and position tracking for shell-like configuration parsing
//!
//! Every lexical and directive error carries a [`Location`]: the name of the
//! source being parsed together with a 1-based line and column.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by custom directive handlers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Represents a position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in characters)
    pub column: usize,
    /// Byte offset from start of input (0-based)
    pub offset: usize,
}

impl Position {
    /// Creates a new position at the start of input
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Computes the position of byte `offset` within `text`
    ///
    /// Offsets past the end of `text` are clamped to its length.
    pub fn at_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let mut position = Self::new();
        position.advance_by(&text[..offset]);
        position
    }

    /// Advances the position by one character
    pub fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.offset += c.len_utf8();
    }

    /// Advances the position by multiple characters
    pub fn advance_by(&mut self, text: &str) {
        for c in text.chars() {
            self.advance(c);
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A position inside a named source (file path or `(eval)`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Name of the source text
    pub source: String,
    /// Position inside the source text
    pub position: Position,
}

impl Location {
    /// Creates a location for byte `offset` of `text`, named `source`
    pub fn new(source: impl Into<String>, text: &str, offset: usize) -> Self {
        Self {
            source: source.into(),
            position: Position::at_offset(text, offset),
        }
    }

    /// Line number (1-based)
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// Column number (1-based)
    pub fn column(&self) -> usize {
        self.position.column
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.position)
    }
}

/// Main error type for parsing and loading configuration
#[derive(Debug, Error)]
pub enum ShlikeError {
    /// Lexical analysis error
    #[error("Lexical error: {0}")]
    Lex(#[from] LexError),

    /// Line directive error
    #[error("Directive error: {0}")]
    Directive(#[from] DirectiveError),

    /// A configuration file could not be read or written
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Path of the file that failed
        path: PathBuf,
        /// Location of the include directive that named the file, if any
        location: Option<Location>,
        #[source]
        source: io::Error,
    },
}

impl ShlikeError {
    /// Returns the source location the error points at, if it has one
    pub fn location(&self) -> Option<&Location> {
        match self {
            ShlikeError::Lex(error) => Some(error.location()),
            ShlikeError::Directive(error) => Some(error.location()),
            ShlikeError::Io { location, .. } => location.as_ref(),
        }
    }
}

/// Lexical analysis errors
#[derive(Debug, Error)]
pub enum LexError {
    /// Single-quoted region not closed before end of input
    #[error("Unterminated single-quoted string at {location}")]
    UnterminatedSingleQuote { location: Location },

    /// Double-quoted region not closed before end of input
    #[error("Unterminated double-quoted string at {location}")]
    UnterminatedDoubleQuote { location: Location },

    /// `$` not followed by a name, a special character, or `{...}`
    #[error("Invalid variable reference at {location}")]
    InvalidVariableReference { location: Location },

    /// Carriage return not followed by a line feed
    #[error("Invalid line break at {location}")]
    InvalidLineBreak { location: Location },

    /// Backslash at end of input
    #[error("Dangling backslash at end of input at {location}")]
    DanglingBackslash { location: Location },

    /// Input that no scanning state accepts
    #[error("Invalid {what} at {location}")]
    Invalid {
        what: &'static str,
        location: Location,
    },

    /// Reference to an unset variable while undefined variables are errors
    #[error("Undefined variable {name:?} at {location}")]
    UndefinedVariable { name: String, location: Location },
}

impl LexError {
    /// Returns the location of the error
    pub fn location(&self) -> &Location {
        match self {
            LexError::UnterminatedSingleQuote { location }
            | LexError::UnterminatedDoubleQuote { location }
            | LexError::InvalidVariableReference { location }
            | LexError::InvalidLineBreak { location }
            | LexError::DanglingBackslash { location }
            | LexError::Invalid { location, .. }
            | LexError::UndefinedVariable { location, .. } => location,
        }
    }
}

/// Line directive errors
#[derive(Debug, Error)]
pub enum DirectiveError {
    /// Include directive with zero or several paths
    #[error("Include expects exactly one path, got {count} at {location}")]
    IncludeArity { count: usize, location: Location },

    /// Directive name with no registered handler
    #[error("Unknown command .{name} at {location}")]
    Unknown { name: String, location: Location },

    /// A custom directive handler returned an error
    #[error("Command .{name} failed at {location}: {source}")]
    Failed {
        name: String,
        location: Location,
        #[source]
        source: BoxError,
    },

    /// A file includes itself, directly or through other files
    #[error("Include cycle detected at {location}: {} is already being loaded", path.display())]
    IncludeCycle { path: PathBuf, location: Location },

    /// Includes nested deeper than the configured limit
    #[error("Maximum include depth {limit} exceeded at {location}")]
    IncludeDepthExceeded { limit: usize, location: Location },
}

impl DirectiveError {
    /// Returns the location of the directive line
    pub fn location(&self) -> &Location {
        match self {
            DirectiveError::IncludeArity { location, .. }
            | DirectiveError::Unknown { location, .. }
            | DirectiveError::Failed { location, .. }
            | DirectiveError::IncludeCycle { location, .. }
            | DirectiveError::IncludeDepthExceeded { location, .. } => location,
        }
    }
}

/// Recoverable conditions reported by a successful parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A `$NAME` reference to a variable that is not set
    UndefinedVariable { name: String, location: Location },
}

impl Warning {
    /// Returns the location the warning points at
    pub fn location(&self) -> &Location {
        match self {
            Warning::UndefinedVariable { location, .. } => location,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UndefinedVariable { name, location } => {
                write!(f, "{location}: WARNING: Undefined variable {name:?}")
            }
        }
    }
}
