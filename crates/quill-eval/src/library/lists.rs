//! `import "lists"`
//!
//! Every function returns a new list; the argument is left untouched.

use std::cmp::Ordering;

use super::{check_arity, int_arg, list_arg, NativeResult, Package};
use crate::error::RuntimeErrorKind;
use crate::evaluator::Evaluator;
use crate::ops;
use crate::value::Value;

pub(super) fn package() -> Package {
    Package::new("lists")
        .function("sort", sort)
        .function("reverse", reverse)
        .function("slice", slice)
        .function("map", map)
        .function("filter", filter)
        .function("sum", sum)
}

/// Ascending order; all numbers or all strings.
fn sort(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("lists.sort", &args, 1, Some(1))?;
    let mut items = list_arg("lists.sort", &args, 0)?;
    // Validate every adjacent pair first so the sort itself cannot fail.
    for pair in items.windows(2) {
        ops::compare(&pair[0], &pair[1]).map_err(|_| {
            RuntimeErrorKind::TypeMismatch(format!(
                "lists.sort: cannot order {} and {}",
                pair[0].type_name(),
                pair[1].type_name()
            ))
        })?;
    }
    items.sort_by(|a, b| ops::compare(a, b).unwrap_or(Ordering::Equal));
    Ok(Value::list(items))
}

fn reverse(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("lists.reverse", &args, 1, Some(1))?;
    let mut items = list_arg("lists.reverse", &args, 0)?;
    items.reverse();
    Ok(Value::list(items))
}

/// `slice(list, start)` or `slice(list, start, end)`, end exclusive.
fn slice(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("lists.slice", &args, 2, Some(3))?;
    let items = list_arg("lists.slice", &args, 0)?;
    let len = items.len();
    let start = int_arg("lists.slice", &args, 1)?;
    let end = match args.get(2) {
        Some(_) => int_arg("lists.slice", &args, 2)?,
        None => len as i64,
    };
    let bound = |index: i64| {
        usize::try_from(index)
            .ok()
            .filter(|i| *i <= len)
            .ok_or(RuntimeErrorKind::IndexOutOfRange { index, len })
    };
    let (from, to) = (bound(start)?, bound(end)?);
    if from > to {
        return Err(RuntimeErrorKind::InvalidArgument(format!(
            "lists.slice: start {start} is after end {end}"
        ))
        .into());
    }
    Ok(Value::list(items[from..to].to_vec()))
}

fn map(ev: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("lists.map", &args, 2, Some(2))?;
    let items = list_arg("lists.map", &args, 0)?;
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        mapped.push(ev.call(&args[1], vec![item])?);
    }
    Ok(Value::list(mapped))
}

fn filter(ev: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("lists.filter", &args, 2, Some(2))?;
    let items = list_arg("lists.filter", &args, 0)?;
    let mut kept = Vec::new();
    for item in items {
        if ev.call(&args[1], vec![item.clone()])?.is_truthy() {
            kept.push(item);
        }
    }
    Ok(Value::list(kept))
}

fn sum(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("lists.sum", &args, 1, Some(1))?;
    let items = list_arg("lists.sum", &args, 0)?;
    let mut total = Value::Int(0);
    for (i, item) in items.iter().enumerate() {
        if item.as_f64().is_none() {
            return Err(RuntimeErrorKind::TypeMismatch(format!(
                "lists.sum: item {i} is {}, not a number",
                item.type_name()
            ))
            .into());
        }
        total = ops::binary(quill_types::ast::BinOp::Add, &total, item)?;
    }
    Ok(total)
}
