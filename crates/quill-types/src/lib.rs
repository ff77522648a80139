//! Shared types for the Quill interpreter.
//!
//! This crate defines the AST node types, source spans, and syntax
//! diagnostics used by the lexer, parser, and evaluator.

mod error;
mod span;
pub mod ast;

pub use error::{Diagnostic, Diagnostics, ErrorCode, MAX_ERRORS};
pub use span::{SourceFile, Span};
