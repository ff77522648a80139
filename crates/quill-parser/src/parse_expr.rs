//! Expression parsing with operator precedence.
//!
//! Precedence (lowest → highest):
//! 6. `||`
//! 5. `&&`
//! 4. `==`, `!=`, `<`, `<=`, `>`, `>=` (no chaining)
//! 3. `+`, `-`
//! 2. `*`, `/`, `%`
//! 1. unary `-`, `!`
//! 0. postfix call `()`, index `[]`, member `.`

use std::rc::Rc;

use quill_lexer::token::TokenKind;
use quill_types::ast::*;
use quill_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.enter()?;
        let result = self.parse_or();
        self.leave();
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_or(&mut self) -> Option<Expr> {
        self.parse_chain(Self::parse_and, |kind| match kind {
            TokenKind::OrOr => Some(BinOp::Or),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> Option<Expr> {
        self.parse_chain(Self::parse_comparison, |kind| match kind {
            TokenKind::AndAnd => Some(BinOp::And),
            _ => None,
        })
    }

    /// Comparison operators do not chain: `a < b < c` is a syntax error.
    fn parse_comparison(&mut self) -> Option<Expr> {
        let left = self.parse_additive()?;
        let Some(op) = self.comparison_op() else {
            return Some(left);
        };
        self.advance();
        self.skip_newlines();
        let right = self.parse_additive()?;
        if self.comparison_op().is_some() {
            self.error_at_current(
                ErrorCode::CHAINED_COMPARISON,
                "comparison operators cannot be chained; combine them with '&&'",
            );
            return None;
        }
        Some(binary(left, op, right))
    }

    fn comparison_op(&self) -> Option<BinOp> {
        match self.peek_kind() {
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::BangEq => Some(BinOp::NotEq),
            TokenKind::Less => Some(BinOp::Less),
            TokenKind::LessEq => Some(BinOp::LessEq),
            TokenKind::Greater => Some(BinOp::Greater),
            TokenKind::GreaterEq => Some(BinOp::GreaterEq),
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        self.parse_chain(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        self.parse_chain(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Percent => Some(BinOp::Mod),
            _ => None,
        })
    }

    /// Left-associative `operand { op operand }`. Each link counts against
    /// the nesting limit until the chain ends.
    fn parse_chain(
        &mut self,
        operand: fn(&mut Self) -> Option<Expr>,
        operator: fn(&TokenKind) -> Option<BinOp>,
    ) -> Option<Expr> {
        let mut left = operand(self)?;
        let mut links = 0;
        let result = loop {
            let Some(op) = operator(self.peek_kind()) else {
                break Some(left);
            };
            if self.enter().is_none() {
                break None;
            }
            links += 1;
            self.advance();
            self.skip_newlines();
            match operand(self) {
                Some(right) => left = binary(left, op, right),
                None => break None,
            }
        };
        self.leave_many(links);
        result
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        let operand = operand?;

        let span = start.merge(operand.span);

        // Fold negated numeric literals.
        if op == UnaryOp::Neg {
            match operand.kind {
                ExprKind::IntLit(n) if n.checked_neg().is_some() => {
                    return Some(Expr::new(ExprKind::IntLit(-n), span));
                }
                ExprKind::FloatLit(n) => {
                    return Some(Expr::new(ExprKind::FloatLit(-n), span));
                }
                _ => {}
            }
        }

        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `primary { "(" args ")" | "[" expr "]" | "." name }`
    ///
    /// Postfix links count against the nesting limit like binary ones.
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        let mut links = 0;
        let result = loop {
            if !matches!(
                self.peek_kind(),
                TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot
            ) {
                break Some(expr);
            }
            if self.enter().is_none() {
                break None;
            }
            links += 1;
            match self.parse_postfix_link(expr) {
                Some(linked) => expr = linked,
                None => break None,
            }
        };
        self.leave_many(links);
        result
    }

    /// One call, index, or member access applied to `expr`.
    fn parse_postfix_link(&mut self, expr: Expr) -> Option<Expr> {
        match self.advance().kind {
            TokenKind::LParen => {
                let args = self.parse_grouped(&TokenKind::RParen, Self::parse_expression)?;
                let span = expr.span.merge(self.previous_span());
                Some(Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                ))
            }
            TokenKind::LBracket => {
                self.push_newline_mode(true);
                let index = self.parse_expression().and_then(|index| {
                    self.expect(&TokenKind::RBracket)?;
                    Some(index)
                });
                self.pop_newline_mode();
                let index = index?;
                let span = expr.span.merge(self.previous_span());
                Some(Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                ))
            }
            _ => {
                let field = self.expect_member_name()?;
                let span = expr.span.merge(field.span);
                Some(Expr::new(
                    ExprKind::Field {
                        object: Box::new(expr),
                        field,
                    },
                    span,
                ))
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let literal = match self.peek_kind() {
            TokenKind::IntLit(n) => Some(ExprKind::IntLit(*n)),
            TokenKind::FloatLit(n) => Some(ExprKind::FloatLit(*n)),
            TokenKind::StringLit(s) => Some(ExprKind::StringLit(s.clone())),
            TokenKind::True => Some(ExprKind::BoolLit(true)),
            TokenKind::False => Some(ExprKind::BoolLit(false)),
            TokenKind::Nil => Some(ExprKind::NilLit),
            TokenKind::Identifier(name) => Some(ExprKind::Identifier(name.clone())),
            _ => None,
        };
        if let Some(kind) = literal {
            self.advance();
            return Some(Expr::new(kind, start));
        }

        match self.peek_kind() {
            TokenKind::LParen => {
                self.advance();
                self.push_newline_mode(true);
                let inner = self.parse_expression().and_then(|inner| {
                    self.expect(&TokenKind::RParen)?;
                    Some(inner)
                });
                self.pop_newline_mode();
                let inner = inner?;
                let span = start.merge(self.previous_span());
                Some(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_grouped(&TokenKind::RBracket, Self::parse_expression)?;
                let span = start.merge(self.previous_span());
                Some(Expr::new(ExprKind::ListLit(items), span))
            }
            TokenKind::LBrace => {
                self.advance();
                let entries = self.parse_grouped(&TokenKind::RBrace, Self::parse_map_entry)?;
                let span = start.merge(self.previous_span());
                Some(Expr::new(ExprKind::MapLit(entries), span))
            }
            TokenKind::Fn => self.parse_lambda(),
            other => {
                let message = format!("expected expression, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    /// `key: value` inside `{ }`.
    fn parse_map_entry(&mut self) -> Option<MapEntry> {
        let start = self.current_span();
        let key = if let TokenKind::StringLit(key) = self.peek_kind() {
            let key = key.clone();
            self.advance();
            key
        } else {
            self.expect_member_name()?.name
        };
        self.expect(&TokenKind::Colon)?;
        let value = self.parse_expression()?;
        Some(MapEntry {
            key,
            span: start.merge(value.span),
            value,
        })
    }

    /// `fn(params) { body }`
    fn parse_lambda(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `fn`
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(Expr::new(
            ExprKind::Lambda(Rc::new(FunctionDef {
                name: None,
                params,
                body,
                span,
            })),
            span,
        ))
    }

    /// Comma-separated items up to `close` (already past the opener).
    /// Newlines are insignificant and a trailing comma is allowed.
    fn parse_grouped<T>(
        &mut self,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Option<T>,
    ) -> Option<Vec<T>> {
        self.push_newline_mode(true);
        let mut items = Vec::new();
        let parsed = loop {
            if self.check(close) {
                break Some(());
            }
            match item(self) {
                Some(value) => items.push(value),
                None => break None,
            }
            if !self.eat(&TokenKind::Comma) {
                break Some(());
            }
        };
        let closed = parsed.and_then(|()| self.expect(close));
        self.pop_newline_mode();
        closed?;
        Some(items)
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}
