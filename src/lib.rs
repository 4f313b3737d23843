//! # shlike
//!
//! A configuration file format built on POSIX `/bin/sh` word splitting,
//! quoting and variable expansion.
//!
//! ## Overview
//!
//! Configuration text is split into lines of words the way a shell splits a
//! command line. Lines either assign a variable or are kept, in order, as
//! plain lines for the application to interpret:
//!
//! ```text
//! # Variables hold lists of words
//! PGHOST = db.example.com
//! FLAGS = --verbose --color
//! FLAGS += --dry-run
//! REDIS_PORT ?= 6379
//!
//! # Everything else is a plain line
//! listen 0.0.0.0 8080
//! run worker $FLAGS
//! greet "Hello, ${PGHOST}"
//! .include local.conf
//! ```
//!
//! ## Syntax
//!
//! - `NAME = words...` sets, `NAME += words...` appends, `NAME ?= words...`
//!   sets only when `NAME` is unset
//! - `'single quotes'` are literal; `"double quotes"` keep whitespace but
//!   expand variables; a backslash makes the next character literal
//! - `$NAME` outside quotes becomes one word per value; inside double quotes
//!   the values are joined with a space, or with any glue: `"${NAME|,}"`
//! - `#` starts a comment
//! - `.include path` (or `. path`) loads another file, relative to the
//!   including file; other `.name` lines call custom directives
//!
//! ## Basic Usage
//!
//! ```rust
//! use shlike::{Config, SimpleConfig};
//!
//! let mut config = SimpleConfig::new();
//! config.set("FOO", vec!["bar".into(), "baz".into()]);
//! config.eval("So, $FOO\nGREETING = \"hello ${FOO|+}\"")?;
//!
//! assert_eq!(config.line(0).unwrap(), ["So,", "bar", "baz"]);
//! assert_eq!(config.get("GREETING").unwrap(), ["hello bar+baz"]);
//! # Ok::<(), shlike::ShlikeError>(())
//! ```
//!
//! ## Custom Directives
//!
//! ```rust
//! use shlike::{Config, Loader, SimpleConfig};
//!
//! let loader = Loader::new().with_directive(
//!     "require",
//!     |config: &mut dyn Config, _name: &str, args: &[String]| {
//!         for name in args {
//!             if config.get(name).is_none() {
//!                 return Err(format!("{name} is required").into());
//!             }
//!         }
//!         Ok(())
//!     },
//! );
//!
//! let mut config = SimpleConfig::new();
//! assert!(loader.eval_into(&mut config, "PORT = 80\n.require PORT").is_ok());
//! assert!(loader.eval_into(&mut config, ".require HOST").is_err());
//! ```
//!
//! ## Serialization
//!
//! [`serialize`] writes variables (sorted by name) followed by the plain
//! lines, quoting words where needed, so the text evaluates back to the same
//! configuration.

pub mod config;
pub mod directive;
pub mod error;
pub mod escape;
pub mod expand;
mod lexer;
pub mod loader;
pub mod scanner;


use std::path::Path;

// Re-export main types and functions
pub use config::{Config, SimpleConfig};
pub use directive::{DirectiveFn, Directives, PendingOperation};
pub use error::{BoxError, DirectiveError, LexError, Location, Position, ShlikeError, Warning};
pub use escape::{escape, escape_line, is_bare_word, serialize};
pub use expand::{Expansion, VariableReference};
pub use loader::{EVAL_SOURCE_NAME, Loader, LoaderOptions, UndefinedVariables};
pub use scanner::Scanner;

/// Evaluates `source` into `config` with the default loader
pub fn eval_into(config: &mut dyn Config, source: &str) -> Result<Vec<Warning>, ShlikeError> {
    Loader::new().eval_into(config, source)
}

/// Loads the file at `path` into `config` with the default loader
pub fn load_into(
    config: &mut dyn Config,
    path: impl AsRef<Path>,
) -> Result<Vec<Warning>, ShlikeError> {
    Loader::new().load_into(config, path)
}
