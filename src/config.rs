//! Configuration containers filled by the lexer
//!
//! [`Config`] is the seam between the lexer and whatever stores the parsed
//! result. [`SimpleConfig`] is the in-memory implementation used by the
//! convenience API.

use crate::error::{ShlikeError, Warning};
use crate::escape;
use crate::loader::Loader;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A configuration object: variables plus an ordered list of plain lines
///
/// The trait is object safe; the lexer and directive handlers work on
/// `&mut dyn Config`.
pub trait Config {
    /// Receives a complete plain line from the lexer
    fn receive_line(&mut self, words: Vec<String>);

    /// Sets `name` to `values`, replacing any previous value
    fn set(&mut self, name: &str, values: Vec<String>);

    /// Appends `values` to `name`, creating the variable when unset
    fn append(&mut self, name: &str, values: Vec<String>);

    /// Returns the values of `name`, or `None` when it is unset
    ///
    /// A variable set to an empty list returns `Some(&[])`.
    fn get(&self, name: &str) -> Option<&[String]>;

    /// Removes `name`
    fn unset(&mut self, name: &str);

    /// Names of all set variables
    fn variables(&self) -> Vec<String>;

    /// Number of plain lines
    fn len(&self) -> usize;

    /// Returns true when there are no plain lines
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain line at `index`
    fn line(&self, index: usize) -> Option<&[String]>;

    /// Iterates over all plain lines in order
    fn lines(&self) -> Box<dyn Iterator<Item = &[String]> + '_>;
}

/// In-memory configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleConfig {
    /// Variable values
    vars: IndexMap<String, Vec<String>>,
    /// Evaluated lines
    lines: Vec<Vec<String>>,
}

impl SimpleConfig {
    /// Creates an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `source` into a fresh configuration
    pub fn parse(source: &str) -> Result<Self, ShlikeError> {
        let mut config = Self::new();
        config.eval(source)?;
        Ok(config)
    }

    /// Variables in the order they were first set
    pub fn vars(&self) -> &IndexMap<String, Vec<String>> {
        &self.vars
    }

    /// All plain lines
    pub fn all_lines(&self) -> &[Vec<String>] {
        &self.lines
    }

    /// Evaluates configuration text into this configuration
    pub fn eval(&mut self, source: &str) -> Result<Vec<Warning>, ShlikeError> {
        Loader::new().eval_into(self, source)
    }

    /// Loads the configuration file at `path` into this configuration
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Vec<Warning>, ShlikeError> {
        Loader::new().load_into(self, path)
    }

    /// Serializes into text that [`SimpleConfig::eval`] can read back
    pub fn serialize(&self) -> String {
        escape::serialize(self)
    }

    /// Writes the serialized configuration to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ShlikeError> {
        let path = path.as_ref();
        let mut text = self.serialize();
        text.push('\n');
        std::fs::write(path, text).map_err(|source| ShlikeError::Io {
            path: path.to_path_buf(),
            location: None,
            source,
        })
    }
}

impl Config for SimpleConfig {
    fn receive_line(&mut self, words: Vec<String>) {
        self.lines.push(words);
    }

    fn set(&mut self, name: &str, values: Vec<String>) {
        self.vars.insert(name.to_owned(), values);
    }

    fn append(&mut self, name: &str, values: Vec<String>) {
        self.vars.entry(name.to_owned()).or_default().extend(values);
    }

    fn get(&self, name: &str) -> Option<&[String]> {
        self.vars.get(name).map(Vec::as_slice)
    }

    fn unset(&mut self, name: &str) {
        self.vars.shift_remove(name);
    }

    fn variables(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<&[String]> {
        self.lines.get(index).map(Vec::as_slice)
    }

    fn lines(&self) -> Box<dyn Iterator<Item = &[String]> + '_> {
        Box::new(self.lines.iter().map(Vec::as_slice))
    }
}
