//! Arithmetic, comparison and unary operators on runtime values.
//!
//! `&&` and `||` short-circuit and are handled by the evaluator.

use std::cmp::Ordering;

use quill_types::ast::{BinOp, UnaryOp};

use crate::error::RuntimeErrorKind;
use crate::value::Value;

type OpResult = Result<Value, RuntimeErrorKind>;

pub(crate) fn binary(op: BinOp, left: &Value, right: &Value) -> OpResult {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => arithmetic(op, left, right),
        BinOp::Eq => Ok(Value::Bool(left == right)),
        BinOp::NotEq => Ok(Value::Bool(left != right)),
        BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => {
            let ordering = compare(left, right)?;
            Ok(Value::Bool(match op {
                BinOp::Less => ordering == Ordering::Less,
                BinOp::LessEq => ordering != Ordering::Greater,
                BinOp::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
    }
}

pub(crate) fn unary(op: UnaryOp, operand: &Value) -> OpResult {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or(RuntimeErrorKind::IntegerOverflow),
        (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnaryOp::Neg, other) => Err(RuntimeErrorKind::TypeMismatch(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}

/// Ordering for `<`-style operators and sorting: numbers numerically,
/// strings lexicographically.
pub(crate) fn compare(left: &Value, right: &Value) -> Result<Ordering, RuntimeErrorKind> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| {
                RuntimeErrorKind::TypeMismatch("cannot compare NaN".to_string())
            }),
            _ => Err(mismatch("compare", left, right)),
        },
    }
}

fn add(left: &Value, right: &Value) -> OpResult {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        _ => arithmetic(BinOp::Add, left, right),
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> OpResult {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return int_arithmetic(op, *a, *b);
    }
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(mismatch(verb(op), left, right));
    };
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div | BinOp::Mod if b == 0.0 => return Err(RuntimeErrorKind::DivisionByZero),
        BinOp::Div => a / b,
        _ => a % b,
    };
    Ok(Value::Float(result))
}

fn int_arithmetic(op: BinOp, a: i64, b: i64) -> OpResult {
    if matches!(op, BinOp::Div | BinOp::Mod) && b == 0 {
        return Err(RuntimeErrorKind::DivisionByZero);
    }
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    result.map(Value::Int).ok_or(RuntimeErrorKind::IntegerOverflow)
}

fn verb(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "subtract",
        BinOp::Mul => "multiply",
        BinOp::Div => "divide",
        _ => "take the remainder of",
    }
}

fn mismatch(verb: &str, left: &Value, right: &Value) -> RuntimeErrorKind {
    RuntimeErrorKind::TypeMismatch(format!(
        "cannot {verb} {} and {}",
        left.type_name(),
        right.type_name()
    ))
}
