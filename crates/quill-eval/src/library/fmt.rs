//! `import "fmt"`

use super::{check_arity, invalid, str_arg, NativeResult, Package};
use crate::evaluator::Evaluator;
use crate::value::Value;

pub(super) fn package() -> Package {
    Package::new("fmt").function("format", format)
}

/// `format(template, args...)`: each `{}` takes the next argument;
/// `{{` and `}}` are literal braces. The argument count must match.
fn format(_: &mut Evaluator, args: Vec<Value>) -> NativeResult {
    check_arity("fmt.format", &args, 1, None)?;
    let template = str_arg("fmt.format", &args, 0)?;
    let mut values = args[1..].iter();
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('}')) => {
                chars.next();
                let value = values
                    .next()
                    .ok_or_else(|| invalid("fmt.format: not enough arguments for template"))?;
                out.push_str(&value.to_string());
            }
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if values.next().is_some() {
        return Err(invalid("fmt.format: too many arguments for template"));
    }
    Ok(Value::Str(out))
}
