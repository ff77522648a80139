//! Core Quill lexer: converts source text to a token stream.
//!
//! - Line breaks and `;` both produce [`TokenKind::Newline`]
//! - `//` line comments and `/* */` block comments are stripped
//! - Error recovery: keeps scanning after a bad character, collecting up
//!   to [`quill_types::MAX_ERRORS`] diagnostics

use quill_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The Quill lexer.
pub struct Lexer<'src> {
    source: &'src str,
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number in characters (1-based).
    col: u32,
    errors: Diagnostics,
}

/// Result of lexing.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: Diagnostics::new(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.is_full() {
                break;
            }
            if let Some(token) = self.scan_token() {
                let is_eof = token.kind == TokenKind::Eof;
                tokens.push(token);
                if is_eof {
                    break;
                }
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Consume `next` if it is the upcoming character.
    fn eat(&mut self, next: char) -> bool {
        if self.peek() == Some(next) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        self.errors
            .push(Diagnostic::new(code, message, span, source_line));
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip spaces, tabs and carriage returns (newlines are tokens).
    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Consume a `/* ... */` comment whose opening `/*` was already eaten.
    /// Returns `true` if the comment spanned a line break.
    fn skip_block_comment(&mut self, start_line: u32, start_col: u32) -> bool {
        let mut crossed_line = false;
        loop {
            match self.advance() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "unterminated block comment",
                        span,
                    );
                    return crossed_line;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return crossed_line;
                }
                Some('\n') => crossed_line = true,
                Some(_) => {}
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token. Returns `None` when the input produced no token
    /// (a comment or a bad character) and scanning should continue.
    fn scan_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let start_line = self.line;
        let start_col = self.col;
        let Some(ch) = self.advance() else {
            return Some(Token::new(TokenKind::Eof, self.current_span()));
        };

        let simple = |lexer: &Self, kind: TokenKind| {
            Some(Token::new(kind, lexer.span_from(start_line, start_col)))
        };

        match ch {
            '\n' | ';' => simple(self, TokenKind::Newline),

            '"' => Some(self.scan_string(start_line, start_col)),
            '0'..='9' => Some(self.scan_number(start_line, start_col)),
            c if c.is_alphabetic() || c == '_' => Some(self.scan_identifier(start_line, start_col)),

            '/' if self.eat('/') => {
                self.skip_line_comment();
                None
            }
            '/' if self.eat('*') => {
                if self.skip_block_comment(start_line, start_col) {
                    simple(self, TokenKind::Newline)
                } else {
                    None
                }
            }

            '+' => {
                let kind = if self.eat('=') { TokenKind::PlusEq } else { TokenKind::Plus };
                simple(self, kind)
            }
            '-' => {
                let kind = if self.eat('=') { TokenKind::MinusEq } else { TokenKind::Minus };
                simple(self, kind)
            }
            '*' => {
                let kind = if self.eat('=') { TokenKind::StarEq } else { TokenKind::Star };
                simple(self, kind)
            }
            '/' => {
                let kind = if self.eat('=') { TokenKind::SlashEq } else { TokenKind::Slash };
                simple(self, kind)
            }
            '%' => {
                let kind = if self.eat('=') { TokenKind::PercentEq } else { TokenKind::Percent };
                simple(self, kind)
            }
            '=' => {
                let kind = if self.eat('=') { TokenKind::EqEq } else { TokenKind::Eq };
                simple(self, kind)
            }
            '!' => {
                let kind = if self.eat('=') { TokenKind::BangEq } else { TokenKind::Bang };
                simple(self, kind)
            }
            '<' => {
                let kind = if self.eat('=') { TokenKind::LessEq } else { TokenKind::Less };
                simple(self, kind)
            }
            '>' => {
                let kind = if self.eat('=') { TokenKind::GreaterEq } else { TokenKind::Greater };
                simple(self, kind)
            }
            '&' if self.eat('&') => simple(self, TokenKind::AndAnd),
            '|' if self.eat('|') => simple(self, TokenKind::OrOr),

            '(' => simple(self, TokenKind::LParen),
            ')' => simple(self, TokenKind::RParen),
            '{' => simple(self, TokenKind::LBrace),
            '}' => simple(self, TokenKind::RBrace),
            '[' => simple(self, TokenKind::LBracket),
            ']' => simple(self, TokenKind::RBracket),
            ',' => simple(self, TokenKind::Comma),
            ':' => simple(self, TokenKind::Colon),
            '.' => simple(self, TokenKind::Dot),

            other => {
                let span = self.span_from(start_line, start_col);
                let message = match other {
                    '&' => "unexpected character '&' (did you mean '&&'?)".to_string(),
                    '|' => "unexpected character '|' (did you mean '||'?)".to_string(),
                    _ => format!("unexpected character '{other}'"),
                };
                self.emit_error(ErrorCode::UNEXPECTED_CHARACTER, message, span);
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Literals & identifiers
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start_line: u32, start_col: u32) -> Token {
        let start = self.pos - 1;
        let mut is_float = false;

        while matches!(self.peek(), Some('0'..='9' | '_')) {
            self.advance();
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some('0'..='9')) {
            is_float = true;
            self.advance();
            while matches!(self.peek(), Some('0'..='9' | '_')) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let digits_at = if matches!(self.peek_at(1), Some('+' | '-')) { 2 } else { 1 };
            if matches!(self.peek_at(digits_at), Some('0'..='9')) {
                is_float = true;
                for _ in 0..=digits_at {
                    self.advance();
                }
                while matches!(self.peek(), Some('0'..='9')) {
                    self.advance();
                }
            }
        }

        let span = self.span_from(start_line, start_col);
        let text: String = self.source[start..self.pos].chars().filter(|&c| c != '_').collect();

        if is_float {
            match text.parse::<f64>() {
                Ok(value) => Token::new(TokenKind::FloatLit(value), span),
                Err(_) => {
                    self.emit_error(
                        ErrorCode::INVALID_NUMBER,
                        format!("invalid float literal '{text}'"),
                        span,
                    );
                    Token::new(TokenKind::FloatLit(0.0), span)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::new(TokenKind::IntLit(value), span),
                Err(_) => {
                    self.emit_error(
                        ErrorCode::INVALID_NUMBER,
                        format!("integer literal '{text}' is out of range"),
                        span,
                    );
                    Token::new(TokenKind::IntLit(0), span)
                }
            }
        }
    }

    fn scan_identifier(&mut self, start_line: u32, start_col: u32) -> Token {
        let start = self.pos - self.source[..self.pos].chars().next_back().map_or(1, char::len_utf8);
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        let kind =
            TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        Token::new(kind, self.span_from(start_line, start_col))
    }

    /// Scan a string literal after its opening `"`.
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Token {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                    );
                    return Token::new(TokenKind::StringLit(buf), span);
                }
                Some('"') => {
                    self.advance();
                    return Token::new(
                        TokenKind::StringLit(buf),
                        self.span_from(start_line, start_col),
                    );
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    /// Scan an escape sequence starting at the `\`.
    /// Returns `None` if nothing should be appended (error emitted).
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // consume '\'

        match self.peek() {
            None | Some('\n') => None,
            Some(ch) => {
                self.advance();
                match ch {
                    'n' => Some('\n'),
                    't' => Some('\t'),
                    'r' => Some('\r'),
                    '0' => Some('\0'),
                    '\\' => Some('\\'),
                    '"' => Some('"'),
                    'u' => self.scan_unicode_escape(start_line, start_col),
                    other => {
                        let span = self.span_from(start_line, start_col);
                        self.emit_error(
                            ErrorCode::INVALID_ESCAPE,
                            format!("invalid escape sequence '\\{other}'"),
                            span,
                        );
                        Some(other)
                    }
                }
            }
        }
    }

    /// `\u{XXXX}` after the `u` was consumed.
    fn scan_unicode_escape(&mut self, start_line: u32, start_col: u32) -> Option<char> {
        let mut digits = String::new();
        let well_formed = self.eat('{') && {
            while let Some(c) = self.peek().filter(char::is_ascii_hexdigit) {
                digits.push(c);
                self.advance();
            }
            self.eat('}')
        };
        let decoded = u32::from_str_radix(&digits, 16)
            .ok()
            .filter(|_| well_formed && (1..=6).contains(&digits.len()))
            .and_then(char::from_u32);
        if decoded.is_none() {
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::INVALID_ESCAPE,
                "invalid unicode escape, expected '\\u{XXXX}'",
                span,
            );
        }
        decoded
    }
}
