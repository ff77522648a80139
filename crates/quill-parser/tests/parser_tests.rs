//! Parser tests: statements, expressions, precedence, newline handling,
//! error recovery, and determinism.

use pretty_assertions::assert_eq;
use quill_parser::{parse_source, ParseResult};
use quill_types::ast::*;
use quill_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Parse source and return the result (program + errors).
fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("main.ql", source);
    parse_source(&sf)
}

/// Parse source and return the program, panicking if there are errors.
fn parse_ok(source: &str) -> Program {
    let result = parse(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.program
}

fn error_codes(source: &str) -> Vec<ErrorCode> {
    parse(source).errors.errors.iter().map(|e| e.code).collect()
}

/// Parse a single expression statement and return its expression.
fn expr(source: &str) -> Expr {
    let mut program = parse_ok(source);
    assert_eq!(program.stmts.len(), 1, "expected one statement");
    match program.stmts.remove(0) {
        Stmt::Expr(stmt) => stmt.expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

fn binary_parts(e: &Expr) -> (&Expr, BinOp, &Expr) {
    match &e.kind {
        ExprKind::Binary { left, op, right } => (left, *op, right),
        other => panic!("expected binary expression, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_program() {
    assert!(parse_ok("").stmts.is_empty());
    assert!(parse_ok("\n\n  // only a comment\n").stmts.is_empty());
}

#[test]
fn test_let_statement() {
    let prog = parse_ok("let answer = 42");
    match &prog.stmts[0] {
        Stmt::Let(s) => {
            assert_eq!(s.name.name, "answer");
            assert_eq!(s.value.kind, ExprKind::IntLit(42));
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_statements_separated_by_semicolons() {
    let prog = parse_ok("let a = 1; let b = 2; println(a + b)");
    assert_eq!(prog.stmts.len(), 3);
}

#[test]
fn test_two_statements_on_one_line_is_an_error() {
    let result = parse("let a = 1 let b = 2");
    assert_eq!(result.errors.total, 1);
    assert!(result.errors.errors[0]
        .message
        .contains("expected end of statement"));
}

#[test]
fn test_function_declaration() {
    let prog = parse_ok("fn add(a, b) {\n  return a + b\n}");
    match &prog.stmts[0] {
        Stmt::Fn(def) => {
            assert_eq!(def.name.as_ref().map(|n| n.name.as_str()), Some("add"));
            let params: Vec<_> = def.params.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(params, vec!["a", "b"]);
            assert_eq!(def.body.stmts.len(), 1);
            assert!(matches!(def.body.stmts[0], Stmt::Return(_)));
        }
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn test_duplicate_parameter_is_rejected() {
    let result = parse("fn f(a, a) { }");
    assert!(result.errors.errors[0].message.contains("duplicate parameter 'a'"));
}

#[test]
fn test_bare_return() {
    let prog = parse_ok("fn f() { return }");
    let Stmt::Fn(def) = &prog.stmts[0] else {
        panic!("expected fn");
    };
    match &def.body.stmts[0] {
        Stmt::Return(r) => assert!(r.value.is_none()),
        other => panic!("expected return, got {other:?}"),
    }
}

#[test]
fn test_if_else_chain() {
    let prog = parse_ok("if a { x() } else if b { y() } else { z() }");
    let Stmt::If(stmt) = &prog.stmts[0] else {
        panic!("expected if");
    };
    let Some(ElseBranch::ElseIf(nested)) = &stmt.else_branch else {
        panic!("expected else-if");
    };
    assert!(matches!(nested.else_branch, Some(ElseBranch::Block(_))));
}

#[test]
fn test_else_on_next_line() {
    let prog = parse_ok("if a {\n  x()\n}\nelse {\n  y()\n}\nz()");
    assert_eq!(prog.stmts.len(), 2);
    let Stmt::If(stmt) = &prog.stmts[0] else {
        panic!("expected if");
    };
    assert!(stmt.else_branch.is_some());
}

#[test]
fn test_if_without_else_keeps_following_statement() {
    let prog = parse_ok("if a { x() }\ny()");
    assert_eq!(prog.stmts.len(), 2);
    assert!(matches!(prog.stmts[1], Stmt::Expr(_)));
}

#[test]
fn test_while_break_continue() {
    let prog = parse_ok("while true {\n  if done { break }\n  continue\n}");
    let Stmt::While(stmt) = &prog.stmts[0] else {
        panic!("expected while");
    };
    assert_eq!(stmt.body.stmts.len(), 2);
    assert!(matches!(stmt.body.stmts[1], Stmt::Continue(_)));
}

#[test]
fn test_for_with_and_without_index() {
    let prog = parse_ok("for x in xs { }\nfor i, x in xs { }");
    let Stmt::For(plain) = &prog.stmts[0] else {
        panic!("expected for");
    };
    assert!(plain.index.is_none());
    assert_eq!(plain.item.name, "x");

    let Stmt::For(indexed) = &prog.stmts[1] else {
        panic!("expected for");
    };
    assert_eq!(indexed.index.as_ref().map(|i| i.name.as_str()), Some("i"));
    assert_eq!(indexed.item.name, "x");
}

#[test]
fn test_import_with_alias() {
    let prog = parse_ok("import \"strings\"\nimport \"math\" as m");
    let Stmt::Import(first) = &prog.stmts[0] else {
        panic!("expected import");
    };
    assert_eq!(first.binding_name(), "strings");
    let Stmt::Import(second) = &prog.stmts[1] else {
        panic!("expected import");
    };
    assert_eq!(second.path, "math");
    assert_eq!(second.binding_name(), "m");
}

#[test]
fn test_import_requires_string_path() {
    let result = parse("import math");
    assert!(result.errors.errors[0]
        .message
        .contains("expected package path string"));
}

// ─────────────────────────────────────────────────────────────────────
// Assignment
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_assignment_targets() {
    let prog = parse_ok("x = 1\nxs[0] = 2\nm.count += 3");
    let targets: Vec<_> = prog
        .stmts
        .iter()
        .map(|s| match s {
            Stmt::Assign(a) => (&a.target, a.op),
            other => panic!("expected assignment, got {other:?}"),
        })
        .collect();
    assert!(matches!(targets[0], (AssignTarget::Variable(_), AssignOp::Assign)));
    assert!(matches!(targets[1], (AssignTarget::Index { .. }, AssignOp::Assign)));
    assert!(matches!(targets[2], (AssignTarget::Field { .. }, AssignOp::Add)));
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(error_codes("f() = 1"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
}

#[test]
fn test_compound_operator_maps_to_binary_op() {
    assert_eq!(AssignOp::Mod.binary_op(), Some(BinOp::Mod));
    assert_eq!(AssignOp::Assign.binary_op(), None);
}

// ─────────────────────────────────────────────────────────────────────
// Expressions & precedence
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let e = expr("1 + 2 * 3");
    let (left, op, right) = binary_parts(&e);
    assert_eq!(op, BinOp::Add);
    assert_eq!(left.kind, ExprKind::IntLit(1));
    let (_, inner, _) = binary_parts(right);
    assert_eq!(inner, BinOp::Mul);
}

#[test]
fn test_subtraction_is_left_associative() {
    let e = expr("10 - 4 - 3");
    let (left, op, right) = binary_parts(&e);
    assert_eq!(op, BinOp::Sub);
    assert_eq!(right.kind, ExprKind::IntLit(3));
    let (_, inner, _) = binary_parts(left);
    assert_eq!(inner, BinOp::Sub);
}

#[test]
fn test_logical_precedence() {
    let e = expr("a || b && c == d");
    let (_, op, right) = binary_parts(&e);
    assert_eq!(op, BinOp::Or);
    let (_, and, cmp) = binary_parts(right);
    assert_eq!(and, BinOp::And);
    let (_, eq, _) = binary_parts(cmp);
    assert_eq!(eq, BinOp::Eq);
}

#[test]
fn test_chained_comparison_is_rejected() {
    assert_eq!(error_codes("a < b < c"), vec![ErrorCode::CHAINED_COMPARISON]);
}

#[test]
fn test_negative_literals_are_folded() {
    assert_eq!(expr("-5").kind, ExprKind::IntLit(-5));
    assert_eq!(expr("-2.5").kind, ExprKind::FloatLit(-2.5));
}

#[test]
fn test_unary_operators() {
    let e = expr("!-x");
    let ExprKind::Unary { op, operand } = &e.kind else {
        panic!("expected unary");
    };
    assert_eq!(*op, UnaryOp::Not);
    assert!(matches!(
        operand.kind,
        ExprKind::Unary {
            op: UnaryOp::Neg,
            ..
        }
    ));
}

#[test]
fn test_postfix_chain() {
    let e = expr("a.b(1)[2]");
    let ExprKind::Index { object, .. } = &e.kind else {
        panic!("expected index");
    };
    let ExprKind::Call { callee, args } = &object.kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 1);
    let ExprKind::Field { field, .. } = &callee.kind else {
        panic!("expected field");
    };
    assert_eq!(field.name, "b");
}

#[test]
fn test_keyword_member_name() {
    let e = expr("opts.in");
    let ExprKind::Field { field, .. } = &e.kind else {
        panic!("expected field");
    };
    assert_eq!(field.name, "in");
}

#[test]
fn test_list_and_map_literals() {
    let e = expr("[1, \"two\", [3]]");
    let ExprKind::ListLit(items) = &e.kind else {
        panic!("expected list");
    };
    assert_eq!(items.len(), 3);

    let prog = parse_ok("let m = {name: \"quill\", \"with space\": 1, if: true}");
    let Stmt::Let(s) = &prog.stmts[0] else {
        panic!("expected let");
    };
    let ExprKind::MapLit(entries) = &s.value.kind else {
        panic!("expected map");
    };
    let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["name", "with space", "if"]);
}

#[test]
fn test_empty_collections() {
    assert_eq!(expr("[]").kind, ExprKind::ListLit(vec![]));
    let prog = parse_ok("let m = {}");
    let Stmt::Let(s) = &prog.stmts[0] else {
        panic!("expected let");
    };
    assert_eq!(s.value.kind, ExprKind::MapLit(vec![]));
}

#[test]
fn test_function_literal() {
    let prog = parse_ok("let double = fn(x) { return x * 2 }");
    let Stmt::Let(s) = &prog.stmts[0] else {
        panic!("expected let");
    };
    let ExprKind::Lambda(def) = &s.value.kind else {
        panic!("expected lambda");
    };
    assert!(def.name.is_none());
    assert_eq!(def.params.len(), 1);
}

#[test]
fn test_missing_expression() {
    let result = parse("let x = )");
    assert_eq!(result.errors.total, 1);
    assert_eq!(
        result.errors.errors[0].to_string(),
        "1:9: expected expression, got ')'"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Newline handling
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_call_arguments_span_lines() {
    let e = expr("f(\n  1,\n  2,\n)");
    let ExprKind::Call { args, .. } = &e.kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 2);
}

#[test]
fn test_multiline_literals() {
    let prog = parse_ok("let xs = [\n  1,\n  2\n]\nlet m = {\n  a: 1,\n  b: fn() {\n    return 2\n  },\n}");
    assert_eq!(prog.stmts.len(), 2);
}

#[test]
fn test_multiline_parameters() {
    let prog = parse_ok("fn f(\n  a,\n  b\n) {\n  return a\n}");
    assert_eq!(prog.stmts.len(), 1);
}

#[test]
fn test_trailing_operator_continues_expression() {
    let e = expr("1 +\n  2");
    let (_, op, _) = binary_parts(&e);
    assert_eq!(op, BinOp::Add);
}

#[test]
fn test_newline_ends_expression() {
    let prog = parse_ok("a\n(b)");
    assert_eq!(prog.stmts.len(), 2);
}

// ─────────────────────────────────────────────────────────────────────
// Spans
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_spans_cover_whole_expression() {
    let e = expr("  foo(1, 2)");
    assert_eq!(e.span.start_line, 1);
    assert_eq!(e.span.start_col, 3);
    assert_eq!(e.span.end_col, 11);
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery & limits
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_recovers_at_statement_boundaries() {
    let result = parse("let = 1\nprintln(\"ok\")\nlet y = *\nprintln(y)");
    assert_eq!(result.errors.total, 2);
    assert_eq!(result.program.stmts.len(), 2);
}

#[test]
fn test_recovers_inside_blocks() {
    let result = parse("fn f() {\n  let = 1\n  return 2\n}\nf()");
    assert_eq!(result.errors.total, 1);
    assert_eq!(result.program.stmts.len(), 2);
}

#[test]
fn test_stray_closing_brace() {
    let result = parse("}\nprintln(1)");
    assert_eq!(result.errors.total, 1);
    assert_eq!(result.program.stmts.len(), 1);
}

#[test]
fn test_diagnostics_quote_the_offending_line() {
    let result = parse("let a = 1\r\nlet = 2\r\nprintln(a)");
    assert_eq!(result.errors.total, 1);
    assert_eq!(result.errors.errors[0].source_line, "let = 2");
}

#[test]
fn test_lexer_errors_come_first() {
    let result = parse("let x = @\nlet = 2");
    let codes: Vec<_> = result.errors.errors.iter().map(|e| e.code).collect();
    assert_eq!(codes[0], ErrorCode::UNEXPECTED_CHARACTER);
    assert!(codes[1..].iter().all(|c| *c == ErrorCode::UNEXPECTED_TOKEN));
}

#[test]
fn test_deep_nesting_is_rejected() {
    let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    let codes = error_codes(&source);
    assert_eq!(codes, vec![ErrorCode::NESTING_TOO_DEEP]);
}

#[test]
fn test_moderate_nesting_is_accepted() {
    let source = format!("{}1{}", "(".repeat(20), ")".repeat(20));
    parse_ok(&source);
}

#[test]
fn test_long_operator_chain_is_rejected() {
    let source = format!("println({})", vec!["1"; 20_000].join(" + "));
    let codes = error_codes(&source);
    assert_eq!(codes, vec![ErrorCode::NESTING_TOO_DEEP]);
}

#[test]
fn test_long_postfix_chain_is_rejected() {
    let source = format!("x{}", "[0]".repeat(20_000));
    let codes = error_codes(&source);
    assert_eq!(codes, vec![ErrorCode::NESTING_TOO_DEEP]);
}

#[test]
fn test_short_chains_are_accepted() {
    let sum = vec!["1"; 40].join(" + ");
    let logic = vec!["a"; 40].join(" && ");
    parse_ok(&format!("println({sum})\nprintln({logic})\nx{}", ".y".repeat(40)));
}

#[test]
fn test_chain_depth_is_released_after_each_statement() {
    let line = format!("let x = {}\n", vec!["1"; 40].join(" * "));
    parse_ok(&line.repeat(10));
}

#[test]
fn test_error_count_is_capped() {
    let source = "let = 1\n".repeat(50);
    let result = parse(&source);
    assert_eq!(result.errors.errors.len(), quill_types::MAX_ERRORS);
}

#[test]
fn test_parsing_is_deterministic() {
    let source = "fn fib(n) {\n  if n < 2 { return n }\n  return fib(n - 1) + fib(n - 2)\n}\nprintln(fib(10))";
    let first = parse_ok(source);
    for i in 0..100 {
        assert_eq!(first, parse_ok(source), "determinism failure at iteration {i}");
    }
}
