//! The embedding entry point: build an interpreter, install a library,
//! evaluate source text.

use quill_lexer::token::TokenKind;
use quill_parser::parse_source;
use quill_types::SourceFile;

use crate::error::{EvalError, LibraryError};
use crate::evaluator::Evaluator;
use crate::library::Library;
use crate::output::OutputSink;
use crate::value::Value;

/// Default bound on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Execution guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Calls nested deeper than this fail with a runtime error. On native
    /// targets the stack grows on demand per call, so the bound holds on
    /// any thread; on wasm32 the engine's own stack limit applies first if
    /// it is smaller.
    pub max_call_depth: usize,
    /// Maximum statements plus expressions per evaluation; `None` is
    /// unbounded.
    pub step_limit: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            step_limit: None,
        }
    }
}

/// A Quill interpreter instance.
///
/// Bindings made by one [`Interpreter::eval`] call stay visible to the next
/// call on the same instance; separate instances share nothing.
pub struct Interpreter {
    evaluator: Evaluator,
}

impl Interpreter {
    /// An interpreter writing to the process's stdout and stderr.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::default()
    }

    /// Validate and install a symbol library: prelude symbols become
    /// globals, packages become importable.
    ///
    /// Nothing is installed unless the whole library is valid.
    pub fn use_library(&mut self, library: &Library) -> Result<(), LibraryError> {
        if library.is_empty() {
            return Err(LibraryError::Empty);
        }

        let mut seen_symbols = Vec::new();
        for (name, _) in library.prelude() {
            if !is_binding_name(name) {
                return Err(LibraryError::InvalidName {
                    kind: "symbol",
                    name: name.clone(),
                });
            }
            if self.evaluator.has_global(name) || seen_symbols.contains(&name) {
                return Err(LibraryError::DuplicateSymbol(name.clone()));
            }
            seen_symbols.push(name);
        }

        let mut seen_packages = Vec::new();
        for package in library.packages() {
            let name = package.name();
            if !is_binding_name(name) {
                return Err(LibraryError::InvalidName {
                    kind: "package",
                    name: name.to_string(),
                });
            }
            if let Some(member) = package.member_names().find(|m| !is_identifier(m)) {
                return Err(LibraryError::InvalidName {
                    kind: "member",
                    name: format!("{name}.{member}"),
                });
            }
            if self.evaluator.has_package(name) || seen_packages.contains(&name) {
                return Err(LibraryError::DuplicatePackage(name.to_string()));
            }
            seen_packages.push(name);
        }

        for (name, value) in library.prelude() {
            self.evaluator.define_global(name, value.clone());
        }
        for package in library.packages() {
            self.evaluator
                .install_package(package.name(), Value::Package(package.clone()));
        }
        Ok(())
    }

    /// Parse and run `source`. Syntax errors stop evaluation before any
    /// statement runs; output written before a runtime error is kept.
    pub fn eval(&mut self, source: &str) -> Result<(), EvalError> {
        let source_file = SourceFile::new("main.ql", source);
        let parsed = parse_source(&source_file);
        if parsed.errors.has_errors() {
            return Err(EvalError::Syntax(parsed.errors));
        }
        self.evaluator.run(&parsed.program)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Configures an [`Interpreter`].
#[derive(Debug, Clone, Default)]
pub struct InterpreterBuilder {
    stdout: OutputSink,
    stderr: Option<OutputSink>,
    limits: Limits,
}

impl InterpreterBuilder {
    pub fn stdout(mut self, sink: impl Into<OutputSink>) -> Self {
        self.stdout = sink.into();
        self
    }

    pub fn stderr(mut self, sink: impl Into<OutputSink>) -> Self {
        self.stderr = Some(sink.into());
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.limits.max_call_depth = depth;
        self
    }

    pub fn step_limit(mut self, limit: Option<u64>) -> Self {
        self.limits.step_limit = limit;
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> Interpreter {
        let stderr = self.stderr.unwrap_or(OutputSink::Stderr);
        Interpreter {
            evaluator: Evaluator::new(self.stdout, stderr, self.limits),
        }
    }
}

/// Identifier syntax as the lexer accepts it.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A name a program can refer to directly: an identifier that is not a
/// keyword.
fn is_binding_name(name: &str) -> bool {
    is_identifier(name) && TokenKind::from_keyword(name).is_none()
}
