//! Global functions available without an import.

use super::{check_arity, float_to_int, int_arg, invalid, str_arg, Library, NativeResult};
use crate::error::{NativeError, RuntimeErrorKind};
use crate::evaluator::Evaluator;
use crate::value::Value;

pub(super) fn install(library: Library) -> Library {
    library
        .with_function("print", print)
        .with_function("println", println)
        .with_function("eprint", eprint)
        .with_function("eprintln", eprintln)
        .with_function("len", len)
        .with_function("str", to_str)
        .with_function("int", to_int)
        .with_function("float", to_float)
        .with_function("type_of", type_of)
        .with_function("range", range)
        .with_function("push", push)
        .with_function("pop", pop)
        .with_function("keys", keys)
        .with_function("contains", contains)
        .with_function("panic", panic)
        .with_function("assert", assert)
}

/// Arguments rendered with `Display` and joined by single spaces.
fn joined(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Output ───────────────────────────────────────────────────────────────

fn print(ev: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    ev.write_stdout(&joined(&args));
    Ok(Value::Nil)
}

fn println(ev: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    ev.write_stdout(&format!("{}\n", joined(&args)));
    Ok(Value::Nil)
}

fn eprint(ev: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    ev.write_stderr(&joined(&args));
    Ok(Value::Nil)
}

fn eprintln(ev: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    ev.write_stderr(&format!("{}\n", joined(&args)));
    Ok(Value::Nil)
}

// ── Conversions ──────────────────────────────────────────────────────────

fn len(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("len", &args, 1, Some(1))?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Map(entries) => entries.borrow().len(),
        other => {
            return Err(RuntimeErrorKind::TypeMismatch(format!(
                "len: {} has no length",
                other.type_name()
            ))
            .into())
        }
    };
    Ok(Value::Int(n as i64))
}

fn to_str(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("str", &args, 1, Some(1))?;
    Ok(Value::Str(args[0].to_string()))
}

fn to_int(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("int", &args, 1, Some(1))?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) => float_to_int(*n).map(Value::Int),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid(format!("cannot convert {s:?} to int"))),
        other => Err(invalid(format!("cannot convert {} to int", other.type_name()))),
    }
}

fn to_float(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("float", &args, 1, Some(1))?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(n) => Ok(Value::Float(*n)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid(format!("cannot convert {s:?} to float"))),
        other => Err(invalid(format!("cannot convert {} to float", other.type_name()))),
    }
}

fn type_of(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("type_of", &args, 1, Some(1))?;
    Ok(Value::str(args[0].type_name()))
}

// ── Collections ──────────────────────────────────────────────────────────

/// `range(end)`, `range(start, end)` or `range(start, end, step)`.
fn range(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("range", &args, 1, Some(3))?;
    let (start, end) = if args.len() == 1 {
        (0, int_arg("range", &args, 0)?)
    } else {
        (int_arg("range", &args, 0)?, int_arg("range", &args, 1)?)
    };
    let step = if args.len() == 3 {
        int_arg("range", &args, 2)?
    } else {
        1
    };
    if step == 0 {
        return Err(invalid("range: step cannot be zero"));
    }

    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        items.push(Value::Int(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(Value::list(items))
}

/// `push(list, values...)` appends in place.
fn push(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("push", &args, 2, None)?;
    let mut args = args.into_iter();
    match args.next() {
        Some(Value::List(items)) => {
            items.borrow_mut().extend(args);
            Ok(Value::Nil)
        }
        Some(other) => Err(RuntimeErrorKind::TypeMismatch(format!(
            "push: argument 1 must be list, got {}",
            other.type_name()
        ))
        .into()),
        None => Ok(Value::Nil),
    }
}

/// Remove and return the last item.
fn pop(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("pop", &args, 1, Some(1))?;
    match &args[0] {
        Value::List(items) => items
            .borrow_mut()
            .pop()
            .ok_or_else(|| invalid("pop from empty list")),
        other => Err(RuntimeErrorKind::TypeMismatch(format!(
            "pop: argument 1 must be list, got {}",
            other.type_name()
        ))
        .into()),
    }
}

fn keys(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("keys", &args, 1, Some(1))?;
    match &args[0] {
        Value::Map(entries) => Ok(Value::list(
            entries.borrow().keys().cloned().map(Value::Str).collect(),
        )),
        other => Err(RuntimeErrorKind::TypeMismatch(format!(
            "keys: argument 1 must be map, got {}",
            other.type_name()
        ))
        .into()),
    }
}

/// List membership, map key presence, or substring search.
fn contains(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("contains", &args, 2, Some(2))?;
    let found = match &args[0] {
        Value::List(items) => items.borrow().contains(&args[1]),
        Value::Map(entries) => {
            let key = str_arg("contains", &args, 1)?;
            entries.borrow().contains_key(key)
        }
        Value::Str(s) => s.contains(str_arg("contains", &args, 1)?),
        other => {
            return Err(RuntimeErrorKind::TypeMismatch(format!(
                "contains: cannot search {}",
                other.type_name()
            ))
            .into())
        }
    };
    Ok(Value::Bool(found))
}

// ── Failure ──────────────────────────────────────────────────────────────

fn panic(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("panic", &args, 1, Some(1))?;
    Err(NativeError::Panic(args[0].to_string()))
}

/// `assert(condition)` or `assert(condition, message)`.
fn assert(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("assert", &args, 1, Some(2))?;
    if args[0].is_truthy() {
        return Ok(Value::Nil);
    }
    let message = match args.get(1) {
        Some(message) => format!("assertion failed: {message}"),
        None => "assertion failed".to_string(),
    };
    Err(RuntimeErrorKind::AssertionFailed(message).into())
}
