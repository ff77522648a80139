//! Statement parsing.

use std::rc::Rc;

use crate::parser::Parser;
use quill_lexer::token::TokenKind;
use quill_types::ast::*;
use quill_types::ErrorCode;

impl<'src> Parser<'src> {
    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        self.enter()?;
        self.push_newline_mode(false);
        let stmts = self.parse_block_body();
        self.pop_newline_mode();
        self.leave();
        self.expect(&TokenKind::RBrace)?;
        Some(Block {
            stmts,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_block_body(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.errors_full() {
                break;
            }
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
            self.skip_newlines();
        }
        stmts
    }

    /// Parse a single statement, including its terminator.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        let stmt = match self.peek_kind() {
            TokenKind::Let => self.parse_let().map(Stmt::Let),
            TokenKind::Fn if matches!(self.look_ahead(1), TokenKind::Identifier(_)) => {
                self.parse_fn_decl().map(Stmt::Fn)
            }
            TokenKind::Return => self.parse_return().map(Stmt::Return),
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::While => self.parse_while().map(Stmt::While),
            TokenKind::For => self.parse_for().map(Stmt::For),
            TokenKind::Break => Some(Stmt::Break(self.advance().span)),
            TokenKind::Continue => Some(Stmt::Continue(self.advance().span)),
            TokenKind::Import => self.parse_import().map(Stmt::Import),
            _ => self.parse_expr_or_assign(),
        }?;
        self.expect_statement_end()?;
        Some(stmt)
    }

    /// `let name = value`
    fn parse_let(&mut self) -> Option<LetStmt> {
        let start = self.advance().span; // eat `let`
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expression()?;
        Some(LetStmt {
            name,
            value,
            span: start.merge(self.previous_span()),
        })
    }

    /// `fn name(params) { body }`
    fn parse_fn_decl(&mut self) -> Option<Rc<FunctionDef>> {
        let start = self.advance().span; // eat `fn`
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Some(Rc::new(FunctionDef {
            name: Some(name),
            params,
            span: start.merge(body.span),
            body,
        }))
    }

    /// `( a, b, c )`, shared by declarations and function literals.
    pub(crate) fn parse_params(&mut self) -> Option<Vec<Ident>> {
        self.expect(&TokenKind::LParen)?;
        self.push_newline_mode(true);
        let params = self.parse_param_list().and_then(|params| {
            self.expect(&TokenKind::RParen)?;
            Some(params)
        });
        self.pop_newline_mode();
        params
    }

    fn parse_param_list(&mut self) -> Option<Vec<Ident>> {
        let mut params: Vec<Ident> = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let param = self.expect_identifier()?;
            if params.iter().any(|p| p.name == param.name) {
                let message = format!("duplicate parameter '{}'", param.name);
                self.error_at(ErrorCode::UNEXPECTED_TOKEN, message, param.span);
                return None;
            }
            params.push(param);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(params)
    }

    /// `return [value]`
    fn parse_return(&mut self) -> Option<ReturnStmt> {
        let start = self.advance().span; // eat `return`
        let value = match self.peek_kind() {
            TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof => None,
            _ => Some(self.parse_expression()?),
        };
        Some(ReturnStmt {
            value,
            span: start.merge(self.previous_span()),
        })
    }

    /// `if cond { } [else if cond { }]* [else { }]`
    ///
    /// `else` may start on the line after the closing brace.
    fn parse_if(&mut self) -> Option<IfStmt> {
        let start = self.advance().span; // eat `if`
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;

        let resume = self.position();
        self.skip_newlines();
        let else_branch = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                self.enter()?;
                let nested = self.parse_if();
                self.leave();
                Some(ElseBranch::ElseIf(Box::new(nested?)))
            } else {
                Some(ElseBranch::Block(self.parse_block()?))
            }
        } else {
            self.rewind(resume);
            None
        };

        Some(IfStmt {
            condition,
            then_block,
            else_branch,
            span: start.merge(self.previous_span()),
        })
    }

    /// `while cond { }`
    fn parse_while(&mut self) -> Option<WhileStmt> {
        let start = self.advance().span; // eat `while`
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Some(WhileStmt {
            condition,
            span: start.merge(body.span),
            body,
        })
    }

    /// `for item in iterable { }` or `for index, item in iterable { }`
    fn parse_for(&mut self) -> Option<ForStmt> {
        let start = self.advance().span; // eat `for`
        let first = self.expect_identifier()?;
        let (index, item) = if self.eat(&TokenKind::Comma) {
            (Some(first), self.expect_identifier()?)
        } else {
            (None, first)
        };
        self.expect(&TokenKind::In)?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;
        Some(ForStmt {
            index,
            item,
            iterable,
            span: start.merge(body.span),
            body,
        })
    }

    /// `import "path" [as alias]`
    fn parse_import(&mut self) -> Option<ImportStmt> {
        let start = self.advance().span; // eat `import`
        let path = match self.peek_kind() {
            TokenKind::StringLit(path) => {
                let path = path.clone();
                self.advance();
                path
            }
            other => {
                let message = format!("expected package path string, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                return None;
            }
        };
        let alias = if self.eat(&TokenKind::As) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        Some(ImportStmt {
            path,
            alias,
            span: start.merge(self.previous_span()),
        })
    }

    /// An expression statement, or an assignment whose target was parsed as
    /// an expression first.
    fn parse_expr_or_assign(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        let op = match self.peek_kind() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Mod,
            _ => {
                let span = expr.span;
                return Some(Stmt::Expr(ExprStmt { expr, span }));
            }
        };
        self.advance(); // eat the operator
        let target_span = expr.span;
        let target = match expr.kind {
            ExprKind::Identifier(name) => AssignTarget::Variable(Ident::new(name, target_span)),
            ExprKind::Index { object, index } => AssignTarget::Index {
                object: *object,
                index: *index,
            },
            ExprKind::Field { object, field } => AssignTarget::Field {
                object: *object,
                field,
            },
            _ => {
                self.error_at(
                    ErrorCode::INVALID_ASSIGNMENT_TARGET,
                    "invalid assignment target",
                    target_span,
                );
                return None;
            }
        };
        let value = self.parse_expression()?;
        Some(Stmt::Assign(AssignStmt {
            target,
            op,
            span: target_span.merge(value.span),
            value,
        }))
    }
}
