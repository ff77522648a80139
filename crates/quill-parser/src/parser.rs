//! Core parser infrastructure: token cursor, newline modes, error reporting.

use quill_lexer::token::{Token, TokenKind};
use quill_lexer::Lexer;
use quill_types::ast::{Ident, Program};
use quill_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Span};

/// Maximum nesting of expressions and blocks. Operator and postfix chains
/// count one level per link.
pub(crate) const MAX_NESTING: u32 = 64;

/// The Quill parser.
///
/// Consumes a token stream produced by the lexer and builds an AST,
/// collecting errors and resynchronizing at statement boundaries.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: Diagnostics,
    /// `true` entries mean newlines are insignificant (inside `()`, `[]`,
    /// map literals); `false` entries are statement blocks.
    newline_modes: Vec<bool>,
    /// Current expression/block nesting depth.
    pub(crate) depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    pub program: Program,
    pub errors: Diagnostics,
}

/// Lex and parse a whole source file, merging the diagnostics of both passes.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file).parse();
    let mut errors = lexed.errors;
    errors.extend(result.errors);
    result.errors = errors;
    result
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: Diagnostics::new(),
            newline_modes: vec![false],
            depth: 0,
        }
    }

    /// Parse the token stream into a [`Program`].
    pub fn parse(mut self) -> ParseResult {
        let start = self.current_span();
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.at_end() && !self.errors_full() {
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => {
                    self.synchronize();
                    // A stray `}` has no enclosing block to close it.
                    self.eat(&TokenKind::RBrace);
                }
            }
            self.skip_newlines();
        }
        let span = start.merge(self.previous_span());
        ParseResult {
            program: Program { stmts, span },
            errors: self.errors,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    fn ignoring_newlines(&self) -> bool {
        self.newline_modes.last().copied().unwrap_or(false)
    }

    /// Index of the token the cursor effectively points at, skipping newlines
    /// when they are insignificant.
    fn effective_pos(&self) -> usize {
        let mut idx = self.pos;
        if self.ignoring_newlines() {
            while matches!(self.tokens.get(idx), Some(t) if t.kind == TokenKind::Newline) {
                idx += 1;
            }
        }
        idx.min(self.tokens.len().saturating_sub(1))
    }

    pub(crate) fn peek(&self) -> &Token {
        static EOF: Token = Token {
            kind: TokenKind::Eof,
            span: Span {
                start_line: 1,
                start_col: 1,
                end_line: 1,
                end_col: 1,
            },
        };
        self.tokens.get(self.effective_pos()).unwrap_or(&EOF)
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Kind of the token `n` positions after the current one (raw, newlines
    /// included).
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.effective_pos() + n)
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let idx = self.effective_pos();
        let token = self.peek().clone();
        if idx < self.tokens.len() {
            self.pos = idx + 1;
        }
        token
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or_else(Span::default, |t| t.span)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Raw cursor position, for bounded backtracking.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn rewind(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub(crate) fn errors_full(&self) -> bool {
        self.errors.is_full()
    }

    // ── Newline Handling ──────────────────────────────────────────────────────

    pub(crate) fn skip_newlines(&mut self) {
        while self.tokens.get(self.pos).is_some_and(|t| t.kind == TokenKind::Newline) {
            self.pos += 1;
        }
    }

    /// Enter a region where newlines are insignificant (`true`) or
    /// significant (`false`). Pair with [`Parser::pop_newline_mode`].
    pub(crate) fn push_newline_mode(&mut self, ignore: bool) {
        self.newline_modes.push(ignore);
    }

    pub(crate) fn pop_newline_mode(&mut self) {
        if self.newline_modes.len() > 1 {
            self.newline_modes.pop();
        }
    }

    /// A statement must be followed by a separator, `}` or end of file.
    pub(crate) fn expect_statement_end(&mut self) -> Option<()> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Some(())
            }
            TokenKind::RBrace | TokenKind::Eof => Some(()),
            other => {
                let message = format!("expected end of statement, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            let message = format!("expected '{}', got '{}'", expected, self.peek_kind());
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
            None
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        if let TokenKind::Identifier(name) = self.peek_kind() {
            let name = name.clone();
            let span = self.advance().span;
            return Some(Ident::new(name, span));
        }
        let message = format!("expected identifier, got '{}'", self.peek_kind());
        self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
        None
    }

    /// An identifier, or a keyword used as a member name after `.` or as a
    /// map key (`m.in`, `{ if: 1 }`).
    pub(crate) fn expect_member_name(&mut self) -> Option<Ident> {
        let kind = self.peek_kind().clone();
        match kind {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            k if k.is_keyword() => {
                let span = self.advance().span;
                Some(Ident::new(k.to_string(), span))
            }
            other => {
                let message = format!("expected member name, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Enter one nesting level; reports an error once the limit is hit.
    pub(crate) fn enter(&mut self) -> Option<()> {
        if self.depth >= MAX_NESTING {
            let message = format!("nesting is too deep (limit is {MAX_NESTING})");
            self.error_at_current(ErrorCode::NESTING_TOO_DEEP, message);
            return None;
        }
        self.depth += 1;
        Some(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn leave_many(&mut self, levels: u32) {
        self.depth = self.depth.saturating_sub(levels);
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        self.errors
            .push(Diagnostic::new(code, message, span, source_line));
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip to the next statement boundary after an error.
    pub(crate) fn synchronize(&mut self) {
        loop {
            match self.tokens.get(self.pos).map(|t| &t.kind) {
                None | Some(TokenKind::Eof | TokenKind::RBrace) => return,
                Some(TokenKind::Newline) => {
                    self.pos += 1;
                    return;
                }
                Some(_) => self.pos += 1,
            }
        }
    }
}
