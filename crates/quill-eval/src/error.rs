//! Error types for the Quill interpreter.

use quill_types::{Diagnostics, Span};

/// Why a program stopped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The source did not lex or parse; nothing was executed.
    #[error("{0}")]
    Syntax(Diagnostics),
    /// A runtime fault at a source location.
    #[error("runtime error at {span}: {kind}")]
    Runtime { span: Span, kind: RuntimeErrorKind },
    /// `panic(value)` called by the program.
    #[error("panic at {span}: {message}")]
    Panic { span: Span, message: String },
}

impl EvalError {
    pub fn runtime(span: Span, kind: RuntimeErrorKind) -> Self {
        Self::Runtime { span, kind }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Runtime fault categories.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("{0}")]
    TypeMismatch(String),
    #[error("wrong number of arguments to {callee}: expected {expected}, got {got}")]
    Arity {
        callee: String,
        expected: String,
        got: usize,
    },
    #[error("{0} is not callable")]
    NotCallable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("{target} has no member '{member}'")]
    UnknownMember { target: String, member: String },
    #[error("package \"{0}\" not found")]
    PackageNotFound(String),
    #[error("'{0}' outside of a loop")]
    OutsideLoop(&'static str),
    #[error("'return' outside of a function")]
    ReturnOutsideFunction,
    #[error("{0}")]
    AssertionFailed(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
    #[error("step budget of {0} exhausted")]
    StepBudgetExhausted(u64),
}

/// Failure reported by a native (Rust-implemented) function.
///
/// The evaluator attaches the call site's span to `Runtime` and `Panic`;
/// `Propagate` carries an error raised inside a callback unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeError {
    Runtime(RuntimeErrorKind),
    Panic(String),
    Propagate(EvalError),
}

impl From<RuntimeErrorKind> for NativeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        Self::Runtime(kind)
    }
}

impl From<EvalError> for NativeError {
    fn from(error: EvalError) -> Self {
        Self::Propagate(error)
    }
}

/// Installing a [`crate::Library`] failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LibraryError {
    #[error("library defines no symbols")]
    Empty,
    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },
    #[error("package \"{0}\" is already installed")]
    DuplicatePackage(String),
    #[error("symbol '{0}' is already defined")]
    DuplicateSymbol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_display() {
        let err = EvalError::runtime(
            Span::point(3, 7),
            RuntimeErrorKind::UndefinedVariable("x".into()),
        );
        assert_eq!(err.to_string(), "runtime error at 3:7: undefined variable 'x'");
    }

    #[test]
    fn test_panic_display() {
        let err = EvalError::Panic {
            span: Span::point(1, 1),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "panic at 1:1: boom");
    }

    #[test]
    fn test_arity_display() {
        let kind = RuntimeErrorKind::Arity {
            callee: "function 'add'".into(),
            expected: "2".into(),
            got: 1,
        };
        assert_eq!(
            kind.to_string(),
            "wrong number of arguments to function 'add': expected 2, got 1"
        );
    }

    #[test]
    fn test_library_error_display() {
        let err = LibraryError::InvalidName {
            kind: "package",
            name: "9lives".into(),
        };
        assert_eq!(err.to_string(), "invalid package name '9lives'");
    }
}
