//! Entry points for evaluating text and loading files
//!
//! A [`Loader`] bundles [`LoaderOptions`] with the custom [`Directives`]
//! registry. Each evaluation runs an [`Evaluator`], which owns the state
//! shared by a source and everything it includes: the target
//! configuration, the include stack and the collected warnings.

use crate::config::Config;
use crate::directive::{self, Directives, INCLUDE};
use crate::error::{BoxError, DirectiveError, LexError, Location, ShlikeError, Warning};
use crate::lexer::Lexer;
use std::fs;
use std::path::{Path, PathBuf};

/// Source name used for in-memory text
pub const EVAL_SOURCE_NAME: &str = "(eval)";

/// How references to unset variables are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndefinedVariables {
    /// Log and report a warning, expand to nothing
    #[default]
    Warn,
    /// Abort the parse with [`LexError::UndefinedVariable`]
    Error,
}

/// Configuration options for the loader
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum nesting of include directives
    pub max_include_depth: usize,
    /// Treatment of references to unset variables
    pub undefined_variables: UndefinedVariables,
}

impl LoaderOptions {
    /// Creates options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum include nesting
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Sets the treatment of undefined variables
    pub fn with_undefined_variables(mut self, behavior: UndefinedVariables) -> Self {
        self.undefined_variables = behavior;
        self
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_include_depth: 64,
            undefined_variables: UndefinedVariables::Warn,
        }
    }
}

/// Evaluates configuration text and files into a [`Config`]
#[derive(Debug, Default)]
pub struct Loader {
    options: LoaderOptions,
    directives: Directives,
}

impl Loader {
    /// Creates a loader with default options and no custom directives
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the options
    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers a custom directive
    pub fn with_directive<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut dyn Config, &str, &[String]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.directives.register(name, handler);
        self
    }

    /// Registers a custom directive on an existing loader
    pub fn register_directive<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut dyn Config, &str, &[String]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.directives.register(name, handler);
    }

    /// Returns the options
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Returns the custom directive registry
    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// Evaluates `source` into `target`, naming it `(eval)`
    pub fn eval_into(
        &self,
        target: &mut dyn Config,
        source: &str,
    ) -> Result<Vec<Warning>, ShlikeError> {
        self.eval_named_into(target, EVAL_SOURCE_NAME, source)
    }

    /// Evaluates `source` into `target` under a caller-chosen name
    ///
    /// Relative include paths resolve against the directory part of `name`.
    pub fn eval_named_into(
        &self,
        target: &mut dyn Config,
        name: &str,
        source: &str,
    ) -> Result<Vec<Warning>, ShlikeError> {
        let mut evaluator = Evaluator::new(target, &self.directives, &self.options);
        evaluator.eval_source(name, source)?;
        Ok(evaluator.warnings)
    }

    /// Loads the file at `path` into `target`
    pub fn load_into(
        &self,
        target: &mut dyn Config,
        path: impl AsRef<Path>,
    ) -> Result<Vec<Warning>, ShlikeError> {
        let mut evaluator = Evaluator::new(target, &self.directives, &self.options);
        evaluator.load_file(path.as_ref(), None)?;
        Ok(evaluator.warnings)
    }
}

/// State shared by one top-level evaluation and its includes
pub(crate) struct Evaluator<'c> {
    config: &'c mut dyn Config,
    directives: &'c Directives,
    options: &'c LoaderOptions,
    include_stack: Vec<PathBuf>,
    warnings: Vec<Warning>,
}

impl<'c> Evaluator<'c> {
    fn new(
        config: &'c mut dyn Config,
        directives: &'c Directives,
        options: &'c LoaderOptions,
    ) -> Self {
        Self {
            config,
            directives,
            options,
            include_stack: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn config(&self) -> &dyn Config {
        &*self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut dyn Config {
        &mut *self.config
    }

    fn eval_source(&mut self, name: &str, text: &str) -> Result<(), ShlikeError> {
        Lexer::new(self, name, text).run()
    }

    /// Reads and evaluates a file; `origin` is the include line, if any
    fn load_file(&mut self, path: &Path, origin: Option<&Location>) -> Result<(), ShlikeError> {
        let identity = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(location) = origin {
            if self.include_stack.len() >= self.options.max_include_depth {
                return Err(DirectiveError::IncludeDepthExceeded {
                    limit: self.options.max_include_depth,
                    location: location.clone(),
                }
                .into());
            }
            if self.include_stack.contains(&identity) {
                return Err(DirectiveError::IncludeCycle {
                    path: path.to_path_buf(),
                    location: location.clone(),
                }
                .into());
            }
        }

        let text = fs::read_to_string(path).map_err(|source| ShlikeError::Io {
            path: path.to_path_buf(),
            location: origin.cloned(),
            source,
        })?;
        tracing::debug!(path = %path.display(), depth = self.include_stack.len(), "loading configuration file");

        self.include_stack.push(identity);
        let result = self.eval_source(&path.to_string_lossy(), &text);
        self.include_stack.pop();
        result
    }

    /// Handles a reference to an unset variable
    pub(crate) fn undefined_variable(
        &mut self,
        name: &str,
        location: Location,
    ) -> Result<(), LexError> {
        match self.options.undefined_variables {
            UndefinedVariables::Warn => {
                tracing::warn!(%location, variable = name, "undefined variable");
                self.warnings.push(Warning::UndefinedVariable {
                    name: name.to_owned(),
                    location,
                });
                Ok(())
            }
            UndefinedVariables::Error => Err(LexError::UndefinedVariable {
                name: name.to_owned(),
                location,
            }),
        }
    }

    /// Runs a directive line read from the source named `source`
    pub(crate) fn run_directive(
        &mut self,
        source: &str,
        words: &[String],
        location: Location,
    ) -> Result<(), ShlikeError> {
        let Some((name, args)) = directive::split_directive(words) else {
            return Ok(());
        };

        if name == INCLUDE {
            let [path] = args else {
                return Err(DirectiveError::IncludeArity {
                    count: args.len(),
                    location,
                }
                .into());
            };
            let resolved = resolve_include(source, path);
            tracing::debug!(%location, path = %resolved.display(), "including file");
            return self.load_file(&resolved, Some(&location));
        }

        let directives = self.directives;
        let Some(handler) = directives.get(name) else {
            return Err(DirectiveError::Unknown {
                name: name.to_owned(),
                location,
            }
            .into());
        };
        handler(self.config_mut(), name, args).map_err(|source| {
            DirectiveError::Failed {
                name: name.to_owned(),
                location,
                source,
            }
            .into()
        })
    }
}

/// Resolves an include path against the directory of the including source
fn resolve_include(source: &str, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match Path::new(source).parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
