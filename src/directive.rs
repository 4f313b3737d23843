//! Per-line operations and the custom directive registry
//!
//! A line is either plain, an assignment (`=`, `+=`, `?=`) or a directive
//! line starting with a bare `.`. Directive lines name their directive in
//! the first word: `.include path` (or `. path`) is built in, any other
//! name is looked up in [`Directives`].

use crate::config::Config;
use crate::error::BoxError;
use indexmap::IndexMap;
use std::fmt;

/// Name of the built-in include directive
pub const INCLUDE: &str = "include";

/// Signature of a custom directive handler
///
/// Handlers receive the configuration, the directive name (without the
/// leading `.`), and the remaining words of the line.
pub type DirectiveFn = dyn Fn(&mut dyn Config, &str, &[String]) -> Result<(), BoxError> + Send + Sync;

/// What to do with the words of the line being assembled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingOperation {
    /// Store the words as a plain line
    #[default]
    Plain,
    /// `NAME = ...`
    Set(String),
    /// `NAME += ...`
    Append(String),
    /// `NAME ?= ...`
    SetIfUnset(String),
    /// `.name ...`
    Directive,
}

impl PendingOperation {
    /// Operation for an assignment operator prefix (`""`, `"+"` or `"?"`)
    pub fn assignment(name: &str, operator: &str) -> Self {
        let name = name.to_owned();
        match operator {
            "+" => PendingOperation::Append(name),
            "?" => PendingOperation::SetIfUnset(name),
            _ => PendingOperation::Set(name),
        }
    }

    /// Returns true for [`PendingOperation::Plain`]
    pub fn is_plain(&self) -> bool {
        matches!(self, PendingOperation::Plain)
    }

    /// Applies a plain or assignment operation to `config`
    ///
    /// Returns the words back when the line is a directive line, which the
    /// loader has to run.
    pub fn apply(self, config: &mut dyn Config, words: Vec<String>) -> Option<Vec<String>> {
        match self {
            PendingOperation::Plain => {
                if !words.is_empty() {
                    config.receive_line(words);
                }
            }
            PendingOperation::Set(name) => config.set(&name, words),
            PendingOperation::Append(name) => config.append(&name, words),
            PendingOperation::SetIfUnset(name) => {
                if config.get(&name).is_none() {
                    config.set(&name, words);
                }
            }
            PendingOperation::Directive => return Some(words),
        }
        None
    }
}

/// Splits a directive line into its name and arguments
///
/// `.` alone names the include directive.
pub fn split_directive(words: &[String]) -> Option<(&str, &[String])> {
    let (head, args) = words.split_first()?;
    let name = head.strip_prefix('.').unwrap_or(head);
    let name = if name.is_empty() { INCLUDE } else { name };
    Some((name, args))
}

/// Registry of custom line directives keyed by name
#[derive(Default)]
pub struct Directives {
    handlers: IndexMap<String, Box<DirectiveFn>>,
}

impl Directives {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous handler
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut dyn Config, &str, &[String]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    /// Removes the handler registered under `name`
    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.shift_remove(name).is_some()
    }

    /// Handler registered under `name`
    pub fn get(&self, name: &str) -> Option<&DirectiveFn> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }

    /// Returns true when `name` has a handler
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Directives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
