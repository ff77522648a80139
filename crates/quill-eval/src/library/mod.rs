//! Symbol libraries: prelude globals plus importable packages.
//!
//! [`Library::standard`] is what every evaluation session loads. Embedders
//! can assemble their own with [`Library::new`], [`Library::with_function`]
//! and [`Library::with_package`].

mod fmt;
mod json;
mod lists;
mod math;
mod prelude;
mod strings;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{NativeError, RuntimeErrorKind};
use crate::value::{NativeFn, Value};

/// A named group of members, bound by `import "name"`.
#[derive(Debug)]
pub struct Package {
    name: String,
    members: BTreeMap<String, Value>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
        }
    }

    /// Add a native function, reported in errors as `package.name`.
    pub fn function(mut self, name: &str, func: NativeFn) -> Self {
        let qualified = format!("{}.{name}", self.name);
        self.members
            .insert(name.to_string(), Value::builtin(qualified, func));
        self
    }

    pub fn constant(mut self, name: &str, value: Value) -> Self {
        self.members.insert(name.to_string(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, member: &str) -> Option<Value> {
        self.members.get(member).cloned()
    }

    pub fn member_names(&self) -> impl Iterator<Item = &String> {
        self.members.keys()
    }
}

/// Prelude symbols and packages to install into an interpreter.
#[derive(Debug, Default)]
pub struct Library {
    prelude: Vec<(String, Value)>,
    packages: Vec<Rc<Package>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard symbol library.
    pub fn standard() -> Self {
        let library = prelude::install(Self::new());
        library
            .with_package(math::package())
            .with_package(strings::package())
            .with_package(lists::package())
            .with_package(json::package())
            .with_package(fmt::package())
    }

    /// Add a global native function.
    pub fn with_function(self, name: &str, func: NativeFn) -> Self {
        self.with_value(name, Value::builtin(name, func))
    }

    /// Add a global value.
    pub fn with_value(mut self, name: &str, value: Value) -> Self {
        self.prelude.push((name.to_string(), value));
        self
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(Rc::new(package));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.prelude.is_empty() && self.packages.is_empty()
    }

    pub fn prelude(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.prelude.iter().map(|(name, value)| (name, value))
    }

    pub fn packages(&self) -> impl Iterator<Item = &Rc<Package>> {
        self.packages.iter()
    }
}

// ── Argument helpers ─────────────────────────────────────────────────────

pub(crate) type NativeResult = Result<Value, NativeError>;

/// Check the argument count; `max` of `None` means variadic.
pub(crate) fn check_arity(
    name: &str,
    args: &[Value],
    min: usize,
    max: Option<usize>,
) -> Result<(), NativeError> {
    let got = args.len();
    let within = got >= min && max.is_none_or(|max| got <= max);
    if within {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    Err(RuntimeErrorKind::Arity {
        callee: format!("'{name}'"),
        expected,
        got,
    }
    .into())
}

fn wrong_type(name: &str, position: usize, expected: &str, got: &Value) -> NativeError {
    RuntimeErrorKind::TypeMismatch(format!(
        "{name}: argument {position} must be {expected}, got {}",
        got.type_name()
    ))
    .into()
}

pub(crate) fn invalid(message: impl Into<String>) -> NativeError {
    RuntimeErrorKind::InvalidArgument(message.into()).into()
}

pub(crate) fn int_arg(name: &str, args: &[Value], index: usize) -> Result<i64, NativeError> {
    match &args[index] {
        Value::Int(n) => Ok(*n),
        other => Err(wrong_type(name, index + 1, "int", other)),
    }
}

pub(crate) fn number_arg(name: &str, args: &[Value], index: usize) -> Result<f64, NativeError> {
    args[index]
        .as_f64()
        .ok_or_else(|| wrong_type(name, index + 1, "a number", &args[index]))
}

pub(crate) fn str_arg<'a>(
    name: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, NativeError> {
    match &args[index] {
        Value::Str(s) => Ok(s),
        other => Err(wrong_type(name, index + 1, "string", other)),
    }
}

/// Snapshot of a list argument's items.
pub(crate) fn list_arg(
    name: &str,
    args: &[Value],
    index: usize,
) -> Result<Vec<Value>, NativeError> {
    match &args[index] {
        Value::List(items) => Ok(items.borrow().clone()),
        other => Err(wrong_type(name, index + 1, "list", other)),
    }
}

/// Convert a float to an int, failing when it is not representable.
pub(crate) fn float_to_int(n: f64) -> Result<i64, NativeError> {
    // 2^63 is the first float above i64::MAX.
    if n.is_finite() && n >= i64::MIN as f64 && n < 9_223_372_036_854_775_808.0 {
        Ok(n as i64)
    } else {
        Err(invalid(format!(
            "cannot convert {} to int",
            crate::value::format_float(n)
        )))
    }
}
