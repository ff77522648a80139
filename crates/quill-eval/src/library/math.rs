//! `import "math"`

use std::cmp::Ordering;

use super::{check_arity, float_to_int, invalid, number_arg, NativeResult, Package};
use crate::error::RuntimeErrorKind;
use crate::evaluator::Evaluator;
use crate::ops;
use crate::value::Value;

pub(super) fn package() -> Package {
    Package::new("math")
        .function("abs", abs)
        .function("min", min)
        .function("max", max)
        .function("floor", floor)
        .function("ceil", ceil)
        .function("round", round)
        .function("sqrt", sqrt)
        .function("pow", pow)
        .constant("pi", Value::Float(std::f64::consts::PI))
        .constant("e", Value::Float(std::f64::consts::E))
}

fn abs(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("math.abs", &args, 1, Some(1))?;
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| RuntimeErrorKind::IntegerOverflow.into()),
        _ => Ok(Value::Float(number_arg("math.abs", &args, 0)?.abs())),
    }
}

fn min(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    extreme("math.min", args, Ordering::Less)
}

fn max(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    extreme("math.max", args, Ordering::Greater)
}

/// The first argument that no other argument beats in direction `wanted`.
fn extreme(name: &str, args: Vec<Value>, wanted: Ordering) -> NativeResult {
    check_arity(name, &args, 1, None)?;
    for i in 0..args.len() {
        number_arg(name, &args, i)?;
    }
    let mut best = args[0].clone();
    for candidate in &args[1..] {
        if ops::compare(candidate, &best)? == wanted {
            best = candidate.clone();
        }
    }
    Ok(best)
}

/// Ints pass through unchanged; floats are rounded with `op` and converted.
fn rounding(name: &str, args: &[Value], op: fn(f64) -> f64) -> NativeResult {
    check_arity(name, args, 1, Some(1))?;
    if let Value::Int(n) = args[0] {
        return Ok(Value::Int(n));
    }
    let n = number_arg(name, args, 0)?;
    float_to_int(op(n)).map(Value::Int)
}

fn floor(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    rounding("math.floor", &args, f64::floor)
}

fn ceil(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    rounding("math.ceil", &args, f64::ceil)
}

fn round(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    rounding("math.round", &args, f64::round)
}

fn sqrt(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("math.sqrt", &args, 1, Some(1))?;
    let n = number_arg("math.sqrt", &args, 0)?;
    if n < 0.0 {
        return Err(invalid("math.sqrt: argument must not be negative"));
    }
    Ok(Value::Float(n.sqrt()))
}

/// Int base with a non-negative int exponent stays an int; anything else
/// is computed in floating point.
fn pow(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("math.pow", &args, 2, Some(2))?;
    if let (Value::Int(base), Value::Int(exp)) = (&args[0], &args[1]) {
        if *exp >= 0 {
            return u32::try_from(*exp)
                .ok()
                .and_then(|exp| base.checked_pow(exp))
                .map(Value::Int)
                .ok_or_else(|| RuntimeErrorKind::IntegerOverflow.into());
        }
    }
    let base = number_arg("math.pow", &args, 0)?;
    let exp = number_arg("math.pow", &args, 1)?;
    Ok(Value::Float(base.powf(exp)))
}
