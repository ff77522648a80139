//! The interpreter seam.
//!
//! A session only needs three things from an interpreter: build one that
//! writes into given buffers, load its standard library, evaluate source.
//! [`QuillEngine`] provides them for the Quill interpreter.

use quill_eval::{Library, Limits, OutputBuffer};

use crate::config::EngineConfig;

/// The two buffers a session reads back after evaluation.
#[derive(Debug, Clone, Default)]
pub struct Streams {
    pub stdout: OutputBuffer,
    pub stderr: OutputBuffer,
}

impl Streams {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The standard library could not be installed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct LibraryLoadError(pub String);

/// Source evaluation failed: syntax error, runtime fault, or user panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EvaluationError(pub String);

/// Creates interpreter instances. Shared by every call, so it must not
/// hold per-call state.
pub trait Engine {
    type Interpreter: Interpreter;

    /// A fresh instance whose output goes to `streams`.
    fn instantiate(&self, streams: &Streams) -> Self::Interpreter;
}

/// One interpreter instance, used for a single call.
pub trait Interpreter {
    fn load_library(&mut self) -> Result<(), LibraryLoadError>;

    fn evaluate(&mut self, source: &str) -> Result<(), EvaluationError>;
}

/// [`Engine`] for the Quill interpreter with the standard library.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuillEngine {
    limits: Limits,
}

impl QuillEngine {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Limits {
            max_call_depth: config.max_call_depth,
            step_limit: config.step_limit,
        })
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }
}

impl Engine for QuillEngine {
    type Interpreter = QuillInterpreter;

    fn instantiate(&self, streams: &Streams) -> QuillInterpreter {
        let interpreter = quill_eval::Interpreter::builder()
            .stdout(streams.stdout.clone())
            .stderr(streams.stderr.clone())
            .limits(self.limits)
            .build();
        QuillInterpreter { interpreter }
    }
}

pub struct QuillInterpreter {
    interpreter: quill_eval::Interpreter,
}

impl Interpreter for QuillInterpreter {
    fn load_library(&mut self) -> Result<(), LibraryLoadError> {
        self.interpreter
            .use_library(&Library::standard())
            .map_err(|e| LibraryLoadError(e.to_string()))
    }

    fn evaluate(&mut self, source: &str) -> Result<(), EvaluationError> {
        self.interpreter
            .eval(source)
            .map_err(|e| EvaluationError(e.to_string()))
    }
}
