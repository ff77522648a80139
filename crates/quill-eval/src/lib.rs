//! Quill tree-walking interpreter.
//!
//! Executes Quill programs directly from the AST. An [`Interpreter`] owns
//! its global scope, its installed packages, and two output sinks; nothing
//! is shared between interpreter instances.

mod env;
mod error;
mod evaluator;
mod interpreter;
pub mod library;
mod ops;
mod output;
mod stack;
mod value;

pub use error::{EvalError, EvalResult, LibraryError, NativeError, RuntimeErrorKind};
pub use evaluator::Evaluator;
pub use interpreter::{Interpreter, InterpreterBuilder, Limits, DEFAULT_MAX_CALL_DEPTH};
pub use library::{Library, Package};
pub use output::{OutputBuffer, OutputSink};
pub use value::{Builtin, Closure, NativeFn, Value};
