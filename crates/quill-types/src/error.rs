use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics stored before the front end gives up.
pub const MAX_ERRORS: usize = 20;

/// Numeric syntax error code (E100–E199).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical (E100–E109) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_ESCAPE: Self = Self(102);
    pub const INVALID_NUMBER: Self = Self(103);
    pub const UNTERMINATED_COMMENT: Self = Self(104);

    // ── Grammar (E110–E119) ──
    pub const UNEXPECTED_TOKEN: Self = Self(110);
    pub const NESTING_TOO_DEEP: Self = Self(111);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(112);
    pub const CHAINED_COMPARISON: Self = Self(113);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A single syntax diagnostic produced by the lexer or parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{span}: {message}")]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// The offending source line, for context.
    pub source_line: String,
}

impl Diagnostic {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }
}

/// Diagnostics collected across one front-end pass.
///
/// Only the first [`MAX_ERRORS`] are stored; `total` keeps counting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub total: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total > 0
    }

    /// Stop scanning once the store is full.
    pub fn is_full(&self) -> bool {
        self.total >= MAX_ERRORS
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(diagnostic);
        }
        self.total += 1;
    }

    /// Append another pass's diagnostics, respecting the cap.
    pub fn extend(&mut self, other: Diagnostics) {
        let dropped = other.total - other.errors.len();
        for diagnostic in other.errors {
            self.push(diagnostic);
        }
        self.total += dropped;
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{diagnostic}")?;
        }
        let hidden = self.total - self.errors.len();
        if hidden > 0 {
            write!(f, "\n... and {hidden} more")?;
        }
        Ok(())
    }
}
