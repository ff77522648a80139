//! Lexically scoped variable environment.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::Value;

struct Scope {
    bindings: RefCell<BTreeMap<String, Value>>,
    parent: Option<Environment>,
}

/// Handle to one scope in a chain of scopes.
///
/// Cloning is cheap and yields a handle to the same scope, which is how
/// closures capture their defining scope.
/// Variables are looked up from the innermost scope outward;
/// `define` always binds in this scope;
/// `set` updates the nearest scope where the variable exists.
#[derive(Clone)]
pub(crate) struct Environment {
    scope: Rc<Scope>,
}

impl Environment {
    /// A root scope with no parent.
    pub fn new() -> Self {
        Self {
            scope: Rc::new(Scope {
                bindings: RefCell::new(BTreeMap::new()),
                parent: None,
            }),
        }
    }

    /// A fresh scope nested inside this one.
    pub fn child(&self) -> Self {
        Self {
            scope: Rc::new(Scope {
                bindings: RefCell::new(BTreeMap::new()),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn define(&self, name: &str, value: Value) {
        self.scope
            .bindings
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let mut env = Some(self);
        while let Some(current) = env {
            if let Some(value) = current.scope.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            env = current.scope.parent.as_ref();
        }
        None
    }

    /// Returns `false` if no scope in the chain defines `name`.
    pub fn set(&self, name: &str, value: Value) -> bool {
        let mut env = Some(self);
        while let Some(current) = env {
            let mut bindings = current.scope.bindings.borrow_mut();
            if let Some(slot) = bindings.get_mut(name) {
                *slot = value;
                return true;
            }
            drop(bindings);
            env = current.scope.parent.as_ref();
        }
        false
    }

    pub fn same_scope(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }

    /// Drop every binding in this scope and all of its ancestors.
    ///
    /// Closures stored in a scope they capture form `Rc` cycles; clearing
    /// the chain when the interpreter is torn down releases them.
    pub fn clear_chain(&self) {
        let mut env = Some(self);
        while let Some(current) = env {
            let bindings = std::mem::take(&mut *current.scope.bindings.borrow_mut());
            drop(bindings);
            env = current.scope.parent.as_ref();
        }
    }
}
