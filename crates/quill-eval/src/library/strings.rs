//! `import "strings"`

use super::{check_arity, int_arg, invalid, list_arg, str_arg, NativeResult, Package};
use crate::evaluator::Evaluator;
use crate::value::Value;

pub(super) fn package() -> Package {
    Package::new("strings")
        .function("upper", upper)
        .function("lower", lower)
        .function("trim", trim)
        .function("split", split)
        .function("join", join)
        .function("contains", contains)
        .function("replace", replace)
        .function("repeat", repeat)
        .function("starts_with", starts_with)
        .function("ends_with", ends_with)
        .function("index_of", index_of)
}

fn upper(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.upper", &args, 1, Some(1))?;
    Ok(Value::str(str_arg("strings.upper", &args, 0)?.to_uppercase()))
}

fn lower(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.lower", &args, 1, Some(1))?;
    Ok(Value::str(str_arg("strings.lower", &args, 0)?.to_lowercase()))
}

fn trim(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.trim", &args, 1, Some(1))?;
    Ok(Value::str(str_arg("strings.trim", &args, 0)?.trim()))
}

/// An empty separator splits into characters.
fn split(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.split", &args, 2, Some(2))?;
    let s = str_arg("strings.split", &args, 0)?;
    let sep = str_arg("strings.split", &args, 1)?;
    let parts = if sep.is_empty() {
        s.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        s.split(sep).map(Value::str).collect()
    };
    Ok(Value::list(parts))
}

/// Items are rendered as `print` would render them.
fn join(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.join", &args, 2, Some(2))?;
    let items = list_arg("strings.join", &args, 0)?;
    let sep = str_arg("strings.join", &args, 1)?;
    let rendered: Vec<String> = items.iter().map(Value::to_string).collect();
    Ok(Value::Str(rendered.join(sep)))
}

fn contains(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.contains", &args, 2, Some(2))?;
    let s = str_arg("strings.contains", &args, 0)?;
    let needle = str_arg("strings.contains", &args, 1)?;
    Ok(Value::Bool(s.contains(needle)))
}

fn replace(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.replace", &args, 3, Some(3))?;
    let s = str_arg("strings.replace", &args, 0)?;
    let from = str_arg("strings.replace", &args, 1)?;
    let to = str_arg("strings.replace", &args, 2)?;
    Ok(Value::Str(s.replace(from, to)))
}

fn repeat(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.repeat", &args, 2, Some(2))?;
    let s = str_arg("strings.repeat", &args, 0)?;
    let count = int_arg("strings.repeat", &args, 1)?;
    let count = usize::try_from(count)
        .map_err(|_| invalid("strings.repeat: count must not be negative"))?;
    Ok(Value::Str(s.repeat(count)))
}

fn starts_with(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.starts_with", &args, 2, Some(2))?;
    let s = str_arg("strings.starts_with", &args, 0)?;
    let prefix = str_arg("strings.starts_with", &args, 1)?;
    Ok(Value::Bool(s.starts_with(prefix)))
}

fn ends_with(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.ends_with", &args, 2, Some(2))?;
    let s = str_arg("strings.ends_with", &args, 0)?;
    let suffix = str_arg("strings.ends_with", &args, 1)?;
    Ok(Value::Bool(s.ends_with(suffix)))
}

/// Character index of the first match, or -1.
fn index_of(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("strings.index_of", &args, 2, Some(2))?;
    let s = str_arg("strings.index_of", &args, 0)?;
    let needle = str_arg("strings.index_of", &args, 1)?;
    let index = s
        .find(needle)
        .map_or(-1, |byte| s[..byte].chars().count() as i64);
    Ok(Value::Int(index))
}
