//! Variable reference resolution
//!
//! Values are never re-scanned, so expansion cannot recurse.

use crate::config::Config;

/// Glue used when a reference does not name one
pub const DEFAULT_GLUE: &str = " ";

/// A parsed `$NAME`, `${NAME}` or `${NAME|glue}` reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableReference<'a> {
    /// Variable name
    pub name: &'a str,
    /// String placed between values when joined into one word
    pub glue: &'a str,
}

impl<'a> VariableReference<'a> {
    /// Reference written without braces
    pub fn plain(name: &'a str) -> Self {
        Self {
            name,
            glue: DEFAULT_GLUE,
        }
    }

    /// Reference from the body of `${...}`; the first `|` starts the glue
    pub fn braced(body: &'a str) -> Self {
        match body.split_once('|') {
            Some((name, glue)) => Self { name, glue },
            None => Self::plain(body),
        }
    }
}

/// Result of resolving a reference against a configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// The variable is not set
    Undefined,
    /// Values joined into text for the current word
    Joined(String),
    /// Values as separate words
    Words(Vec<String>),
}

/// Resolves `reference`; `quoted` selects joining over word splitting
pub fn expand(config: &dyn Config, reference: &VariableReference<'_>, quoted: bool) -> Expansion {
    match config.get(reference.name) {
        None => Expansion::Undefined,
        Some(values) if quoted => Expansion::Joined(values.join(reference.glue)),
        Some(values) => Expansion::Words(values.to_vec()),
    }
}
