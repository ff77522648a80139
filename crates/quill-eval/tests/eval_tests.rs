//! Integration tests for the Quill interpreter.
//!
//! Covers:
//! - output capture on both streams
//! - expressions, control flow, closures, collections
//! - runtime errors, panics and syntax errors with positions
//! - the standard library packages
//! - library installation rules
//! - call-depth and step guards

use pretty_assertions::assert_eq;
use quill_eval::{
    EvalError, Evaluator, Interpreter, InterpreterBuilder, Library, LibraryError, NativeError,
    OutputBuffer, Package, RuntimeErrorKind, Value,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

struct Run {
    stdout: String,
    stderr: String,
    result: Result<(), EvalError>,
}

fn run_with(source: &str, configure: impl FnOnce(InterpreterBuilder) -> InterpreterBuilder) -> Run {
    let stdout = OutputBuffer::new();
    let stderr = OutputBuffer::new();
    let builder = Interpreter::builder()
        .stdout(stdout.clone())
        .stderr(stderr.clone());
    let mut interp = configure(builder).build();
    interp
        .use_library(&Library::standard())
        .expect("standard library installs");
    let result = interp.eval(source);
    Run {
        stdout: stdout.contents(),
        stderr: stderr.contents(),
        result,
    }
}

fn run(source: &str) -> Run {
    run_with(source, |b| b)
}

/// Run and return stdout, panicking on any evaluation error.
fn output(source: &str) -> String {
    let run = run(source);
    if let Err(e) = &run.result {
        panic!("unexpected error: {e}\nstdout so far: {}", run.stdout);
    }
    run.stdout
}

/// Run and return the error message, panicking if evaluation succeeded.
fn error(source: &str) -> String {
    match run(source).result {
        Ok(()) => panic!("expected an error from:\n{source}"),
        Err(e) => e.to_string(),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Output
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_println_hello() {
    assert_eq!(output("println(\"hello\")"), "hello\n");
}

#[test]
fn test_print_joins_arguments_with_spaces() {
    assert_eq!(output("print(1, \"two\", 3.5, nil, true)"), "1 two 3.5 nil true");
}

#[test]
fn test_println_without_arguments() {
    assert_eq!(output("println()"), "\n");
}

#[test]
fn test_stderr_is_separate() {
    let run = run("println(\"out\")\neprintln(\"err\")\neprint(\"!\")");
    assert!(run.result.is_ok());
    assert_eq!(run.stdout, "out\n");
    assert_eq!(run.stderr, "err\n!");
}

#[test]
fn test_empty_program_produces_nothing() {
    let run = run("");
    assert!(run.result.is_ok());
    assert_eq!(run.stdout, "");
    assert_eq!(run.stderr, "");
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_arithmetic() {
    assert_eq!(
        output("println(1 + 2 * 3, (1 + 2) * 3, 7 / 2, 7 % 3, 7.0 / 2, -4 + 1)"),
        "7 9 3 1 3.5 -3\n"
    );
}

#[test]
fn test_string_and_list_concatenation() {
    assert_eq!(output("println(\"ab\" + \"cd\", [1] + [2, 3])"), "abcd [1, 2, 3]\n");
}

#[test]
fn test_comparisons_and_logic() {
    assert_eq!(
        output("println(1 < 2, 2 <= 1, \"a\" < \"b\", 1 == 1.0, [1, 2] == [1, 2], nil == false)"),
        "true false true true true false\n"
    );
    assert_eq!(output("println(true && false, false || true, !nil)"), "false true true\n");
}

#[test]
fn test_logical_operators_short_circuit() {
    let source = "fn boom() { panic(\"evaluated\") }\nprintln(false && boom(), true || boom())";
    assert_eq!(output(source), "false true\n");
}

#[test]
fn test_compound_assignment() {
    let source = "let x = 10\nx += 5\nx -= 3\nx *= 2\nx /= 4\nx %= 4\nprintln(x)";
    assert_eq!(output(source), "2\n");
}

#[test]
fn test_string_indexing_counts_characters() {
    assert_eq!(output("let s = \"héllo\"\nprintln(s[1], len(s))"), "é 5\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Control flow
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_if_else_chain() {
    let source = r#"
fn classify(n) {
  if n < 0 {
    return "negative"
  } else if n == 0 {
    return "zero"
  }
  else {
    return "positive"
  }
}
println(classify(-1), classify(0), classify(5))
"#;
    assert_eq!(output(source), "negative zero positive\n");
}

#[test]
fn test_while_with_break_and_continue() {
    let source = r#"
let i = 0
let total = 0
while true {
  i += 1
  if i > 10 { break }
  if i % 2 == 0 { continue }
  total += i
}
println(total)
"#;
    assert_eq!(output(source), "25\n");
}

#[test]
fn test_for_over_list_map_and_string() {
    let source = r#"
for i, x in ["a", "b"] { print(i, x, "") }
println()
let m = {b: 2, a: 1}
for k in m { print(k) }
for k, v in m { print(k, v, "") }
println()
for c in "hey" { print(c, "") }
"#;
    assert_eq!(output(source), "0 a 1 b \naba 1 b 2 \nh e y ");
}

#[test]
fn test_for_snapshot_allows_mutation() {
    let source = "let xs = [1, 2]\nfor x in xs { push(xs, x) }\nprintln(xs)";
    assert_eq!(output(source), "[1, 2, 1, 2]\n");
}

#[test]
fn test_block_scoping() {
    let source = "let x = 1\nif true {\n  let x = 2\n  println(x)\n}\nprintln(x)";
    assert_eq!(output(source), "2\n1\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions & closures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_recursion() {
    let source = "fn fib(n) {\n  if n < 2 { return n }\n  return fib(n - 1) + fib(n - 2)\n}\nprintln(fib(15))";
    assert_eq!(output(source), "610\n");
}

#[test]
fn test_closures_capture_their_scope() {
    let source = r#"
fn counter() {
  let n = 0
  return fn() {
    n += 1
    return n
  }
}
let a = counter()
let b = counter()
a()
a()
println(a(), b())
"#;
    assert_eq!(output(source), "3 1\n");
}

#[test]
fn test_function_without_return_yields_nil() {
    assert_eq!(output("fn f() { }\nprintln(f())"), "nil\n");
}

#[test]
fn test_functions_are_values() {
    let source = "let apply = fn(f, x) { return f(x) }\nprintln(apply(fn(n) { return n * n }, 7), type_of(apply))";
    assert_eq!(output(source), "49 function\n");
}

#[test]
fn test_arity_mismatch() {
    let msg = error("fn add(a, b) { return a + b }\nadd(1)");
    assert_eq!(
        msg,
        "runtime error at 2:1: wrong number of arguments to function 'add': expected 2, got 1"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Collections
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_lists_are_shared_references() {
    let source = "let a = [1]\nlet b = a\npush(b, 2)\nprintln(a)\nprintln(len(a), pop(a), b)";
    assert_eq!(output(source), "[1, 2]\n2 2 [1]\n");
}

#[test]
fn test_index_assignment() {
    let source = "let xs = [1, 2, 3]\nxs[1] = 20\nxs[2] += 1\nprintln(xs)";
    assert_eq!(output(source), "[1, 20, 4]\n");
}

#[test]
fn test_maps() {
    let source = r#"
let m = {name: "quill"}
m.version = 1
m["tag"] = "beta"
m.version += 1
println(m, m.missing, keys(m), contains(m, "tag"))
"#;
    assert_eq!(
        output(source),
        "{\"name\": \"quill\", \"tag\": \"beta\", \"version\": 2} nil [\"name\", \"tag\", \"version\"] true\n"
    );
}

#[test]
fn test_range_variants() {
    assert_eq!(
        output("println(range(3), range(2, 5), range(10, 0, -3), range(0))"),
        "[0, 1, 2] [2, 3, 4] [10, 7, 4, 1] []\n"
    );
}

#[test]
fn test_conversions() {
    assert_eq!(
        output("println(str(12) + \"!\", int(\" 42 \"), int(3.9), float(2), int(true), type_of(1.0))"),
        "12! 42 3 2.0 1 float\n"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Packages
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_math_package() {
    let source = r#"
import "math"
println(math.abs(-3), math.min(4, 2.5, 9), math.max(1, 7), math.floor(2.7), math.ceil(2.1))
println(math.round(2.5), math.sqrt(16), math.pow(2, 10), math.pow(2, 0.5) > 1.41, math.pi > 3.14)
"#;
    assert_eq!(output(source), "3 2.5 7 2 3\n3 4.0 1024 true true\n");
}

#[test]
fn test_strings_package_with_alias() {
    let source = r#"
import "strings" as s
println(s.upper("abc"), s.lower("ABC"), s.trim("  x  "), s.split("a,b,c", ","))
println(s.join([1, "b", 3], "-"), s.contains("hello", "ell"), s.replace("aXbX", "X", "_"))
println(s.repeat("ab", 3), s.starts_with("quill", "qu"), s.ends_with("quill", "ll"), s.index_of("héllo", "l"))
"#;
    assert_eq!(
        output(source),
        "ABC abc x [\"a\", \"b\", \"c\"]\n1-b-3 true a_b_\nababab true true 2\n"
    );
}

#[test]
fn test_lists_package() {
    let source = r#"
import "lists"
let xs = [3, 1, 2]
println(lists.sort(xs), xs, lists.reverse(xs), lists.slice(xs, 1), lists.slice(xs, 0, 2))
println(lists.map(xs, fn(x) { return x * 10 }), lists.filter(xs, fn(x) { return x > 1 }), lists.sum(xs), lists.sum([1, 0.5]))
"#;
    assert_eq!(
        output(source),
        "[1, 2, 3] [3, 1, 2] [2, 1, 3] [1, 2] [3, 1]\n[30, 10, 20] [3, 2] 6 1.5\n"
    );
}

#[test]
fn test_json_package() {
    let source = r#"
import "json"
println(json.encode({b: [1, 2.5, nil], a: "x", ok: true}))
let v = json.decode("{\"n\": 3, \"items\": [\"p\", {\"q\": false}]}")
println(v.n + 1, v.items[1].q, type_of(v.items))
"#;
    assert_eq!(
        output(source),
        "{\"a\":\"x\",\"b\":[1,2.5,null],\"ok\":true}\n4 false list\n"
    );
}

#[test]
fn test_json_decode_error() {
    let msg = error("import \"json\"\njson.decode(\"{oops\")");
    assert!(msg.starts_with("runtime error at 2:1: json.decode: invalid JSON:"), "{msg}");
}

#[test]
fn test_fmt_format() {
    let source = "import \"fmt\"\nprintln(fmt.format(\"{} + {} = {}, {{literal}}\", 1, 2, [3]))";
    assert_eq!(output(source), "1 + 2 = [3], {literal}\n");
}

#[test]
fn test_fmt_format_argument_mismatch() {
    assert!(error("import \"fmt\"\nfmt.format(\"{} {}\", 1)").contains("not enough arguments"));
    assert!(error("import \"fmt\"\nfmt.format(\"{}\", 1, 2)").contains("too many arguments"));
}

#[test]
fn test_package_must_be_imported() {
    assert_eq!(
        error("math.abs(1)"),
        "runtime error at 1:1: undefined variable 'math'"
    );
}

#[test]
fn test_unknown_package() {
    assert_eq!(
        error("import \"net/http\""),
        "runtime error at 1:1: package \"net/http\" not found"
    );
}

#[test]
fn test_unknown_package_member() {
    assert_eq!(
        error("import \"math\"\nmath.tau"),
        "runtime error at 2:6: package \"math\" has no member 'tau'"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_undefined_variable() {
    assert_eq!(error("println(x)"), "runtime error at 1:9: undefined variable 'x'");
}

#[test]
fn test_assignment_requires_declaration() {
    assert_eq!(error("y = 3"), "runtime error at 1:1: undefined variable 'y'");
}

#[test]
fn test_partial_output_is_kept_on_runtime_error() {
    let run = run("println(\"before\")\neprintln(\"warn\")\nlet z = 1 / 0\nprintln(\"after\")");
    assert_eq!(run.stdout, "before\n");
    assert_eq!(run.stderr, "warn\n");
    assert_eq!(
        run.result.unwrap_err().to_string(),
        "runtime error at 3:9: division by zero"
    );
}

#[test]
fn test_runtime_error_kind_is_exposed() {
    let err = run("[1, 2][5]").result.unwrap_err();
    assert!(matches!(
        err,
        EvalError::Runtime {
            kind: RuntimeErrorKind::IndexOutOfRange { index: 5, len: 2 },
            ..
        }
    ));
}

#[test]
fn test_integer_overflow() {
    assert_eq!(
        error("let big = 9223372036854775807\nbig + 1"),
        "runtime error at 2:1: integer overflow"
    );
}

#[test]
fn test_type_mismatch() {
    assert_eq!(error("\"a\" + 1"), "runtime error at 1:1: cannot add string and int");
}

#[test]
fn test_calling_a_non_function() {
    assert_eq!(error("let n = 3\nn()"), "runtime error at 2:1: int is not callable");
}

#[test]
fn test_panic() {
    let run = run("println(\"start\")\npanic(\"something broke\")\nprintln(\"unreachable\")");
    assert_eq!(run.stdout, "start\n");
    assert_eq!(
        run.result.unwrap_err().to_string(),
        "panic at 2:1: something broke"
    );
}

#[test]
fn test_assert() {
    assert_eq!(output("assert(1 < 2)"), "");
    assert_eq!(
        error("assert(1 > 2, \"math is broken\")"),
        "runtime error at 1:1: assertion failed: math is broken"
    );
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(error("break"), "runtime error at 1:1: 'break' outside of a loop");
}

#[test]
fn test_break_does_not_cross_function_boundary() {
    let source = "fn f() { break }\nwhile true { f() }";
    assert_eq!(error(source), "runtime error at 1:10: 'break' outside of a loop");
}

#[test]
fn test_return_outside_function() {
    assert_eq!(error("return 1"), "runtime error at 1:1: 'return' outside of a function");
}

#[test]
fn test_syntax_error_runs_nothing() {
    let run = run("println(\"never\")\nlet = 5");
    assert_eq!(run.stdout, "");
    let err = run.result.unwrap_err();
    assert!(matches!(err, EvalError::Syntax(_)));
    assert_eq!(err.to_string(), "2:5: expected identifier, got '='");
}

#[test]
fn test_multiple_syntax_errors_are_listed() {
    let msg = error("let = 1\nlet = 2");
    assert_eq!(msg, "1:5: expected identifier, got '='\n2:5: expected identifier, got '='");
}

// ══════════════════════════════════════════════════════════════════════════════
// Guards
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_runaway_recursion_hits_call_depth() {
    let msg = error("fn down(n) { return down(n + 1) }\ndown(0)");
    assert!(msg.ends_with("maximum call depth of 200 exceeded"), "{msg}");
}

#[test]
fn test_custom_call_depth() {
    let source = "fn down(n) {\n  if n == 0 { return 0 }\n  return down(n - 1)\n}\nprintln(down(20))";
    let run = run_with(source, |b| b.max_call_depth(10));
    assert!(run
        .result
        .unwrap_err()
        .to_string()
        .ends_with("maximum call depth of 10 exceeded"));
    let run = run_with(source, |b| b.max_call_depth(50));
    assert_eq!(run.stdout, "0\n");
}

#[test]
fn test_step_limit_stops_infinite_loop() {
    let run = run_with("while true { }", |b| b.step_limit(Some(1_000)));
    assert_eq!(
        run.result.unwrap_err().to_string(),
        "runtime error at 1:7: step budget of 1000 exhausted"
    );
}

#[test]
fn test_generous_step_limit_is_invisible() {
    let run = run_with("println(1 + 1)", |b| b.step_limit(Some(1_000)));
    assert!(run.result.is_ok());
    assert_eq!(run.stdout, "2\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Library installation
// ══════════════════════════════════════════════════════════════════════════════

fn answer(_: &mut Evaluator, _: Vec<Value>) -> Result<Value, NativeError> {
    Ok(Value::Int(42))
}

#[test]
fn test_custom_library() {
    let stdout = OutputBuffer::new();
    let mut interp = Interpreter::builder().stdout(stdout.clone()).build();
    let library = Library::standard()
        .with_function("answer", answer)
        .with_package(Package::new("consts").constant("two", Value::Int(2)));
    interp.use_library(&library).unwrap();
    interp.eval("import \"consts\"\nprintln(answer() + consts.two)").unwrap();
    assert_eq!(stdout.contents(), "44\n");
}

#[test]
fn test_empty_library_is_rejected() {
    let mut interp = Interpreter::new();
    assert_eq!(interp.use_library(&Library::new()), Err(LibraryError::Empty));
}

#[test]
fn test_invalid_package_name_is_rejected() {
    let mut interp = Interpreter::new();
    let library = Library::new().with_package(Package::new("net/http"));
    assert_eq!(
        interp.use_library(&library),
        Err(LibraryError::InvalidName {
            kind: "package",
            name: "net/http".into(),
        })
    );
}

#[test]
fn test_installing_twice_is_rejected() {
    let mut interp = Interpreter::new();
    interp.use_library(&Library::standard()).unwrap();
    let again = interp.use_library(&Library::new().with_package(Package::new("math")));
    assert_eq!(again, Err(LibraryError::DuplicatePackage("math".into())));
}

#[test]
fn test_failed_install_leaves_interpreter_untouched() {
    let stdout = OutputBuffer::new();
    let mut interp = Interpreter::builder().stdout(stdout.clone()).build();
    let bad = Library::new()
        .with_function("answer", answer)
        .with_package(Package::new("9bad"));
    assert!(interp.use_library(&bad).is_err());
    let err = interp.eval("answer()").unwrap_err();
    assert_eq!(err.to_string(), "runtime error at 1:1: undefined variable 'answer'");
}

// ══════════════════════════════════════════════════════════════════════════════
// Isolation & determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_bindings_persist_within_one_interpreter() {
    let stdout = OutputBuffer::new();
    let mut interp = Interpreter::builder().stdout(stdout.clone()).build();
    interp.use_library(&Library::standard()).unwrap();
    interp.eval("let x = 1").unwrap();
    interp.eval("println(x)").unwrap();
    assert_eq!(stdout.contents(), "1\n");
}

#[test]
fn test_separate_interpreters_share_nothing() {
    assert!(run("let x = 1").result.is_ok());
    assert_eq!(error("println(x)"), "runtime error at 1:9: undefined variable 'x'");
}

#[test]
fn test_evaluation_is_deterministic() {
    let source = r#"
let m = {z: 1, a: [1, 2], m: {k: "v"}}
for k, v in m { println(k, v) }
import "json"
println(json.encode(m))
"#;
    let first = output(source);
    for i in 0..100 {
        assert_eq!(first, output(source), "determinism failure at iteration {i}");
    }
}
