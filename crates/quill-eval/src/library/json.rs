//! `import "json"`, backed by `serde_json`.

use std::collections::BTreeMap;

use super::{check_arity, invalid, str_arg, NativeResult, Package};
use crate::error::NativeError;
use crate::evaluator::Evaluator;
use crate::value::Value;

/// Containers nested deeper than this cannot be encoded.
const MAX_ENCODE_DEPTH: usize = 64;

pub(super) fn package() -> Package {
    Package::new("json")
        .function("encode", encode)
        .function("decode", decode)
}

/// Compact JSON text. Map keys come out sorted.
fn encode(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("json.encode", &args, 1, Some(1))?;
    let json = to_json(&args[0], 0)?;
    serde_json::to_string(&json)
        .map(Value::Str)
        .map_err(|e| invalid(format!("json.encode: {e}")))
}

fn decode(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("json.decode", &args, 1, Some(1))?;
    let text = str_arg("json.decode", &args, 0)?;
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| invalid(format!("json.decode: invalid JSON: {e}")))?;
    Ok(from_json(json))
}

fn to_json(value: &Value, depth: usize) -> Result<serde_json::Value, NativeError> {
    if depth > MAX_ENCODE_DEPTH {
        return Err(invalid("json.encode: value is nested too deeply"));
    }
    Ok(match value {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| invalid(format!("json.encode: cannot encode {n} as JSON")))?,
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => {
            let items = items.borrow();
            let mut array = Vec::with_capacity(items.len());
            for item in items.iter() {
                array.push(to_json(item, depth + 1)?);
            }
            serde_json::Value::Array(array)
        }
        Value::Map(entries) => {
            let entries = entries.borrow();
            let mut object = serde_json::Map::new();
            for (key, item) in entries.iter() {
                object.insert(key.clone(), to_json(item, depth + 1)?);
            }
            serde_json::Value::Object(object)
        }
        other => {
            return Err(invalid(format!(
                "json.encode: cannot encode {} as JSON",
                other.type_name()
            )))
        }
    })
}

/// Integral numbers that fit in i64 become ints; other numbers floats.
fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => Value::list(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(object) => {
            let entries: BTreeMap<String, Value> = object
                .into_iter()
                .map(|(key, item)| (key, from_json(item)))
                .collect();
            Value::map(entries)
        }
    }
}
