//! Runtime values.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use quill_types::ast::FunctionDef;

use crate::env::Environment;
use crate::error::NativeError;
use crate::evaluator::Evaluator;
use crate::library::Package;

/// Nested containers deeper than this print as `...`.
const MAX_DISPLAY_DEPTH: usize = 32;

/// Signature of functions implemented in Rust.
pub type NativeFn = fn(&mut Evaluator, Vec<Value>) -> Result<Value, NativeError>;

/// A Quill runtime value.
///
/// Lists and maps are shared, mutable references: assigning one to a new
/// variable aliases it. Maps iterate in key order.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<BTreeMap<String, Value>>>),
    Function(Rc<Closure>),
    Builtin(Rc<Builtin>),
    Package(Rc<Package>),
}

/// A user-defined function together with the scope it was created in.
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub(crate) env: Environment,
}

impl Closure {
    /// How the function is named in error messages.
    pub fn describe(&self) -> String {
        match &self.def.name {
            Some(name) => format!("function '{}'", name.name),
            None => "anonymous function".to_string(),
        }
    }
}

/// A native function bound to a name.
pub struct Builtin {
    pub name: String,
    pub func: NativeFn,
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn builtin(name: impl Into<String>, func: NativeFn) -> Self {
        Value::Builtin(Rc::new(Builtin {
            name: name.into(),
            func,
        }))
    }

    /// Type name as reported by `type_of` and in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) | Value::Builtin(_) => "function",
            Value::Package(_) => "package",
        }
    }

    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Numeric view, promoting ints.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Quoted form used inside containers and by `Debug`.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, true, 0);
        out
    }

    fn render(&self, out: &mut String, quoted: bool, depth: usize) {
        match self {
            Value::Nil => out.push_str("nil"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(n) => out.push_str(&format_float(*n)),
            Value::Str(s) if quoted => out.push_str(&format!("{s:?}")),
            Value::Str(s) => out.push_str(s),
            Value::List(items) => {
                if depth >= MAX_DISPLAY_DEPTH {
                    out.push_str("[...]");
                    return;
                }
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render(out, true, depth + 1);
                }
                out.push(']');
            }
            Value::Map(entries) => {
                if depth >= MAX_DISPLAY_DEPTH {
                    out.push_str("{...}");
                    return;
                }
                out.push('{');
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&format!("{key:?}: "));
                    value.render(out, true, depth + 1);
                }
                out.push('}');
            }
            Value::Function(closure) => match &closure.def.name {
                Some(name) => out.push_str(&format!("<fn {}>", name.name)),
                None => out.push_str("<fn>"),
            },
            Value::Builtin(builtin) => out.push_str(&format!("<builtin {}>", builtin.name)),
            Value::Package(package) => out.push_str(&format!("<package {}>", package.name())),
        }
    }
}

/// Floats always show a fractional part so they read differently from ints.
pub(crate) fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

/// Plain form used by `print` and `str`: strings are unquoted at the top
/// level only.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out, false, 0);
        f.write_str(&out)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

/// Structural equality. Ints and floats compare numerically; functions and
/// packages compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Package(a), Value::Package(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
