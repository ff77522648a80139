//! Core statement and expression evaluator.

use std::collections::BTreeMap;
use std::rc::Rc;

use quill_types::ast::*;
use quill_types::Span;

use crate::env::Environment;
use crate::error::{EvalError, EvalResult, NativeError, RuntimeErrorKind};
use crate::interpreter::Limits;
use crate::ops;
use crate::output::OutputSink;
use crate::stack::ensure_sufficient_stack;
use crate::value::{Builtin, Closure, Value};

/// Non-local control flow out of a statement.
enum Flow {
    Break(Span),
    Continue(Span),
    Return(Value),
    Error(EvalError),
}

impl From<EvalError> for Flow {
    fn from(error: EvalError) -> Self {
        Flow::Error(error)
    }
}

type ExecResult = Result<(), Flow>;

/// The tree walker. One per [`crate::Interpreter`].
///
/// Native functions receive `&mut Evaluator` so they can write output and
/// call back into Quill functions.
pub struct Evaluator {
    globals: Environment,
    packages: BTreeMap<String, Value>,
    stdout: OutputSink,
    stderr: OutputSink,
    limits: Limits,
    /// Steps taken in the current run, counted against `limits.step_limit`.
    steps: u64,
    /// Active Quill and native calls.
    depth: usize,
    /// Span of the native call currently executing.
    call_span: Span,
    /// Scopes captured by closures, cleared on drop to break `Rc` cycles.
    captured: Vec<Environment>,
}

impl Evaluator {
    pub(crate) fn new(stdout: OutputSink, stderr: OutputSink, limits: Limits) -> Self {
        Self {
            globals: Environment::new(),
            packages: BTreeMap::new(),
            stdout,
            stderr,
            limits,
            steps: 0,
            depth: 0,
            call_span: Span::default(),
            captured: Vec::new(),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Embedding surface
    // ══════════════════════════════════════════════════════════════════════

    pub fn write_stdout(&self, text: &str) {
        self.stdout.write(text);
    }

    pub fn write_stderr(&self, text: &str) {
        self.stderr.write(text);
    }

    /// Call a Quill value from native code (e.g. the mapper passed to
    /// `lists.map`). Errors are attributed to the enclosing native call.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, NativeError> {
        let span = self.call_span;
        self.call_value(callee, args, span)
            .map_err(NativeError::Propagate)
    }

    pub(crate) fn define_global(&mut self, name: &str, value: Value) {
        self.globals.define(name, value);
    }

    pub(crate) fn has_global(&self, name: &str) -> bool {
        self.globals.get(name).is_some()
    }

    pub(crate) fn install_package(&mut self, name: &str, package: Value) {
        self.packages.insert(name.to_string(), package);
    }

    pub(crate) fn has_package(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Execute a parsed program in the global scope.
    pub(crate) fn run(&mut self, program: &Program) -> EvalResult<()> {
        self.steps = 0;
        self.depth = 0;
        let globals = self.globals.clone();
        for stmt in &program.stmts {
            self.exec_stmt(stmt, &globals).map_err(|flow| escaped(flow, stmt.span()))?;
        }
        Ok(())
    }

    /// Count one step against the optional budget.
    fn tick(&mut self, span: Span) -> EvalResult<()> {
        self.steps += 1;
        match self.limits.step_limit {
            Some(limit) if self.steps > limit => Err(EvalError::runtime(
                span,
                RuntimeErrorKind::StepBudgetExhausted(limit),
            )),
            _ => Ok(()),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> ExecResult {
        self.tick(stmt.span())?;
        match stmt {
            Stmt::Let(s) => {
                let value = self.eval_expr(&s.value, env)?;
                env.define(&s.name.name, value);
                Ok(())
            }
            Stmt::Fn(def) => {
                let closure = self.make_closure(def, env);
                if let Some(name) = &def.name {
                    env.define(&name.name, closure);
                }
                Ok(())
            }
            Stmt::Return(s) => {
                let value = match &s.value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Nil,
                };
                Err(Flow::Return(value))
            }
            Stmt::If(s) => self.exec_if(s, env),
            Stmt::While(s) => self.exec_while(s, env),
            Stmt::For(s) => self.exec_for(s, env),
            Stmt::Break(span) => Err(Flow::Break(*span)),
            Stmt::Continue(span) => Err(Flow::Continue(*span)),
            Stmt::Import(s) => self.exec_import(s, env),
            Stmt::Assign(s) => self.exec_assign(s, env),
            Stmt::Expr(s) => {
                self.eval_expr(&s.expr, env)?;
                Ok(())
            }
        }
    }

    fn exec_block(&mut self, block: &Block, env: &Environment) -> ExecResult {
        let scope = env.child();
        for stmt in &block.stmts {
            self.exec_stmt(stmt, &scope)?;
        }
        Ok(())
    }

    fn exec_if(&mut self, stmt: &IfStmt, env: &Environment) -> ExecResult {
        if self.eval_expr(&stmt.condition, env)?.is_truthy() {
            return self.exec_block(&stmt.then_block, env);
        }
        match &stmt.else_branch {
            Some(ElseBranch::ElseIf(nested)) => self.exec_if(nested, env),
            Some(ElseBranch::Block(block)) => self.exec_block(block, env),
            None => Ok(()),
        }
    }

    fn exec_while(&mut self, stmt: &WhileStmt, env: &Environment) -> ExecResult {
        while self.eval_expr(&stmt.condition, env)?.is_truthy() {
            match self.exec_block(&stmt.body, env) {
                Ok(()) | Err(Flow::Continue(_)) => {}
                Err(Flow::Break(_)) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// Lists yield `(index, item)`, maps `(key, value)` in key order,
    /// strings `(index, char)`. The collection is snapshotted first, so the
    /// body may mutate it freely.
    fn exec_for(&mut self, stmt: &ForStmt, env: &Environment) -> ExecResult {
        let iterable = self.eval_expr(&stmt.iterable, env)?;
        let pairs: Vec<(Value, Value)> = match &iterable {
            Value::List(items) => items
                .borrow()
                .iter()
                .enumerate()
                .map(|(i, item)| (Value::Int(i as i64), item.clone()))
                .collect(),
            Value::Map(entries) => entries
                .borrow()
                .iter()
                .map(|(key, value)| (Value::str(key.clone()), value.clone()))
                .collect(),
            Value::Str(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (Value::Int(i as i64), Value::Str(c.to_string())))
                .collect(),
            other => {
                let kind = RuntimeErrorKind::TypeMismatch(format!(
                    "cannot iterate over {}",
                    other.type_name()
                ));
                return Err(EvalError::runtime(stmt.iterable.span, kind).into());
            }
        };
        let is_map = matches!(iterable, Value::Map(_));

        for (first, second) in pairs {
            let scope = env.child();
            match &stmt.index {
                Some(index) => {
                    scope.define(&index.name, first);
                    scope.define(&stmt.item.name, second);
                }
                // A single variable over a map binds the key.
                None if is_map => scope.define(&stmt.item.name, first),
                None => scope.define(&stmt.item.name, second),
            }
            match self.exec_block(&stmt.body, &scope) {
                Ok(()) | Err(Flow::Continue(_)) => {}
                Err(Flow::Break(_)) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    fn exec_import(&mut self, stmt: &ImportStmt, env: &Environment) -> ExecResult {
        let Some(package) = self.packages.get(&stmt.path).cloned() else {
            let kind = RuntimeErrorKind::PackageNotFound(stmt.path.clone());
            return Err(EvalError::runtime(stmt.span, kind).into());
        };
        env.define(stmt.binding_name(), package);
        Ok(())
    }

    fn exec_assign(&mut self, stmt: &AssignStmt, env: &Environment) -> ExecResult {
        match &stmt.target {
            AssignTarget::Variable(ident) => {
                let undefined = || {
                    EvalError::runtime(
                        ident.span,
                        RuntimeErrorKind::UndefinedVariable(ident.name.clone()),
                    )
                };
                let value = match stmt.op.binary_op() {
                    None => self.eval_expr(&stmt.value, env)?,
                    Some(op) => {
                        let current = env.get(&ident.name).ok_or_else(undefined)?;
                        let rhs = self.eval_expr(&stmt.value, env)?;
                        self.apply(op, &current, &rhs, stmt.span)?
                    }
                };
                if !env.set(&ident.name, value) {
                    return Err(undefined().into());
                }
            }
            AssignTarget::Index { object, index } => {
                let container = self.eval_expr(object, env)?;
                let key = self.eval_expr(index, env)?;
                let value = match stmt.op.binary_op() {
                    None => self.eval_expr(&stmt.value, env)?,
                    Some(op) => {
                        let current = self.index_value(&container, &key, index.span)?;
                        let rhs = self.eval_expr(&stmt.value, env)?;
                        self.apply(op, &current, &rhs, stmt.span)?
                    }
                };
                self.store_index(&container, &key, value, index.span)?;
            }
            AssignTarget::Field { object, field } => {
                let container = self.eval_expr(object, env)?;
                let value = match stmt.op.binary_op() {
                    None => self.eval_expr(&stmt.value, env)?,
                    Some(op) => {
                        let current = self.field_value(&container, field)?;
                        let rhs = self.eval_expr(&stmt.value, env)?;
                        self.apply(op, &current, &rhs, stmt.span)?
                    }
                };
                let Value::Map(entries) = &container else {
                    let kind = RuntimeErrorKind::TypeMismatch(format!(
                        "cannot set field '{}' on {}",
                        field.name,
                        container.type_name()
                    ));
                    return Err(EvalError::runtime(field.span, kind).into());
                };
                entries.borrow_mut().insert(field.name.clone(), value);
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> EvalResult<Value> {
        self.tick(expr.span)?;
        match &expr.kind {
            ExprKind::IntLit(n) => Ok(Value::Int(*n)),
            ExprKind::FloatLit(n) => Ok(Value::Float(*n)),
            ExprKind::StringLit(s) => Ok(Value::Str(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NilLit => Ok(Value::Nil),
            ExprKind::ListLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, env)?);
                }
                Ok(Value::list(values))
            }
            ExprKind::MapLit(entries) => {
                let mut map = BTreeMap::new();
                for entry in entries {
                    let value = self.eval_expr(&entry.value, env)?;
                    map.insert(entry.key.clone(), value);
                }
                Ok(Value::map(map))
            }
            ExprKind::Identifier(name) => env.get(name).ok_or_else(|| {
                EvalError::runtime(expr.span, RuntimeErrorKind::UndefinedVariable(name.clone()))
            }),
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right, env),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand, env)?;
                ops::unary(*op, &value).map_err(|kind| EvalError::runtime(expr.span, kind))
            }
            ExprKind::Call { callee, args } => {
                let function = self.eval_expr(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env)?);
                }
                self.call_value(&function, values, expr.span)
            }
            ExprKind::Index { object, index } => {
                let container = self.eval_expr(object, env)?;
                let key = self.eval_expr(index, env)?;
                self.index_value(&container, &key, index.span)
            }
            ExprKind::Field { object, field } => {
                let container = self.eval_expr(object, env)?;
                self.field_value(&container, field)
            }
            ExprKind::Lambda(def) => Ok(self.make_closure(def, env)),
            ExprKind::Paren(inner) => self.eval_expr(inner, env),
        }
    }

    fn eval_binary(
        &mut self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        env: &Environment,
    ) -> EvalResult<Value> {
        let lhs = self.eval_expr(left, env)?;
        match op {
            BinOp::And if !lhs.is_truthy() => return Ok(Value::Bool(false)),
            BinOp::Or if lhs.is_truthy() => return Ok(Value::Bool(true)),
            _ => {}
        }
        let rhs = self.eval_expr(right, env)?;
        self.apply(op, &lhs, &rhs, left.span.merge(right.span))
    }

    fn apply(&self, op: BinOp, lhs: &Value, rhs: &Value, span: Span) -> EvalResult<Value> {
        ops::binary(op, lhs, rhs).map_err(|kind| EvalError::runtime(span, kind))
    }

    fn index_value(&self, container: &Value, key: &Value, span: Span) -> EvalResult<Value> {
        let fail = |kind| EvalError::runtime(span, kind);
        match (container, key) {
            (Value::List(items), Value::Int(i)) => {
                let items = items.borrow();
                checked_index(*i, items.len())
                    .map(|idx| items[idx].clone())
                    .map_err(fail)
            }
            (Value::Str(s), Value::Int(i)) => {
                let len = s.chars().count();
                checked_index(*i, len)
                    .and_then(|idx| {
                        s.chars()
                            .nth(idx)
                            .map(|c| Value::Str(c.to_string()))
                            .ok_or(RuntimeErrorKind::IndexOutOfRange { index: *i, len })
                    })
                    .map_err(fail)
            }
            (Value::Map(entries), Value::Str(k)) => {
                Ok(entries.borrow().get(k).cloned().unwrap_or(Value::Nil))
            }
            (Value::List(_) | Value::Str(_), other) => Err(fail(RuntimeErrorKind::TypeMismatch(
                format!("{} index must be int, got {}", container.type_name(), other.type_name()),
            ))),
            (Value::Map(_), other) => Err(fail(RuntimeErrorKind::TypeMismatch(format!(
                "map key must be string, got {}",
                other.type_name()
            )))),
            (other, _) => Err(fail(RuntimeErrorKind::TypeMismatch(format!(
                "cannot index {}",
                other.type_name()
            )))),
        }
    }

    fn store_index(&self, container: &Value, key: &Value, value: Value, span: Span) -> EvalResult<()> {
        let fail = |kind| EvalError::runtime(span, kind);
        match (container, key) {
            (Value::List(items), Value::Int(i)) => {
                let mut items = items.borrow_mut();
                let idx = checked_index(*i, items.len()).map_err(fail)?;
                items[idx] = value;
                Ok(())
            }
            (Value::Map(entries), Value::Str(k)) => {
                entries.borrow_mut().insert(k.clone(), value);
                Ok(())
            }
            (Value::List(_), other) => Err(fail(RuntimeErrorKind::TypeMismatch(format!(
                "list index must be int, got {}",
                other.type_name()
            )))),
            (Value::Map(_), other) => Err(fail(RuntimeErrorKind::TypeMismatch(format!(
                "map key must be string, got {}",
                other.type_name()
            )))),
            (other, _) => Err(fail(RuntimeErrorKind::TypeMismatch(format!(
                "cannot assign into {}",
                other.type_name()
            )))),
        }
    }

    /// `value.name`: map entries (missing keys read as `nil`) and package
    /// members.
    fn field_value(&self, container: &Value, field: &Ident) -> EvalResult<Value> {
        match container {
            Value::Map(entries) => Ok(entries
                .borrow()
                .get(&field.name)
                .cloned()
                .unwrap_or(Value::Nil)),
            Value::Package(package) => package.get(&field.name).ok_or_else(|| {
                EvalError::runtime(
                    field.span,
                    RuntimeErrorKind::UnknownMember {
                        target: format!("package \"{}\"", package.name()),
                        member: field.name.clone(),
                    },
                )
            }),
            other => Err(EvalError::runtime(
                field.span,
                RuntimeErrorKind::UnknownMember {
                    target: other.type_name().to_string(),
                    member: field.name.clone(),
                },
            )),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    fn make_closure(&mut self, def: &Rc<FunctionDef>, env: &Environment) -> Value {
        if !self.captured.last().is_some_and(|last| last.same_scope(env)) {
            self.captured.push(env.clone());
        }
        Value::Function(Rc::new(Closure {
            def: Rc::clone(def),
            env: env.clone(),
        }))
    }

    fn call_value(&mut self, callee: &Value, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        if self.depth >= self.limits.max_call_depth {
            return Err(EvalError::runtime(
                span,
                RuntimeErrorKind::CallDepthExceeded(self.limits.max_call_depth),
            ));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| match callee {
            Value::Function(closure) => self.call_closure(closure, args, span),
            Value::Builtin(builtin) => self.call_builtin(builtin, args, span),
            other => Err(EvalError::runtime(
                span,
                RuntimeErrorKind::NotCallable(other.type_name().to_string()),
            )),
        });
        self.depth -= 1;
        result
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        let def = &closure.def;
        if args.len() != def.params.len() {
            return Err(EvalError::runtime(
                span,
                RuntimeErrorKind::Arity {
                    callee: closure.describe(),
                    expected: def.params.len().to_string(),
                    got: args.len(),
                },
            ));
        }
        let scope = closure.env.child();
        for (param, arg) in def.params.iter().zip(args) {
            scope.define(&param.name, arg);
        }
        for stmt in &def.body.stmts {
            match self.exec_stmt(stmt, &scope) {
                Ok(()) => {}
                Err(Flow::Return(value)) => return Ok(value),
                Err(flow) => return Err(escaped(flow, stmt.span())),
            }
        }
        Ok(Value::Nil)
    }

    fn call_builtin(&mut self, builtin: &Builtin, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        let outer = std::mem::replace(&mut self.call_span, span);
        let result = (builtin.func)(self, args);
        self.call_span = outer;
        result.map_err(|error| match error {
            NativeError::Runtime(kind) => EvalError::runtime(span, kind),
            NativeError::Panic(message) => EvalError::Panic { span, message },
            NativeError::Propagate(error) => error,
        })
    }
}

impl Drop for Evaluator {
    fn drop(&mut self) {
        for env in self.captured.drain(..) {
            env.clear_chain();
        }
        self.globals.clear_chain();
        self.packages.clear();
    }
}

/// Convert control flow that escaped its construct into an error.
fn escaped(flow: Flow, span: Span) -> EvalError {
    match flow {
        Flow::Error(error) => error,
        Flow::Break(span) => EvalError::runtime(span, RuntimeErrorKind::OutsideLoop("break")),
        Flow::Continue(span) => {
            EvalError::runtime(span, RuntimeErrorKind::OutsideLoop("continue"))
        }
        Flow::Return(_) => EvalError::runtime(span, RuntimeErrorKind::ReturnOutsideFunction),
    }
}

/// Bounds-check a user index; negative indices are out of range.
fn checked_index(index: i64, len: usize) -> Result<usize, RuntimeErrorKind> {
    usize::try_from(index)
        .ok()
        .filter(|idx| *idx < len)
        .ok_or(RuntimeErrorKind::IndexOutOfRange { index, len })
}
