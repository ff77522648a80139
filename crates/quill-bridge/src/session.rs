//! Evaluation sessions: one interpreter and two buffers per call.
//!
//! ```text
//! Idle → LoadingLibrary → Evaluating → Succeeded | Failed → Done
//!                       ↘ LoadFailed → Done
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::engine::{Engine, EvaluationError, Interpreter, LibraryLoadError, Streams};
use crate::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    LoadingLibrary,
    LoadFailed,
    Evaluating,
    Succeeded,
    Failed,
    Done,
}

/// What a session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The library loaded and the source ran, successfully or not. Output
    /// written before a failure is kept.
    Completed {
        stdout: String,
        stderr: String,
        error: Option<EvaluationError>,
    },
    /// The library failed to load; nothing was evaluated.
    LoadFailed(LibraryLoadError),
}

impl SessionOutcome {
    pub fn render(&self) -> String {
        report::render(self)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Completed { error: None, .. })
    }
}

/// A single-use evaluation context. Nothing in it outlives [`run`].
///
/// [`run`]: EvaluationSession::run
pub struct EvaluationSession<I> {
    interpreter: I,
    streams: Streams,
    phase: SessionPhase,
}

impl<I: Interpreter> EvaluationSession<I> {
    pub fn new<E>(engine: &E) -> Self
    where
        E: Engine<Interpreter = I> + ?Sized,
    {
        let streams = Streams::new();
        let interpreter = engine.instantiate(&streams);
        Self {
            interpreter,
            streams,
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Load the library, then evaluate `source` exactly once.
    pub fn run(mut self, source: &str) -> SessionOutcome {
        let digest = source_digest(source);
        debug!(source = %digest, bytes = source.len(), "session started");

        self.enter(SessionPhase::LoadingLibrary);
        let interpreter = &mut self.interpreter;
        let loaded = guarded(|| interpreter.load_library())
            .unwrap_or_else(|fault| Err(LibraryLoadError(fault)));
        if let Err(error) = loaded {
            self.enter(SessionPhase::LoadFailed);
            warn!(source = %digest, %error, "standard library failed to load");
            self.enter(SessionPhase::Done);
            return SessionOutcome::LoadFailed(error);
        }

        self.enter(SessionPhase::Evaluating);
        let interpreter = &mut self.interpreter;
        let evaluated = guarded(|| interpreter.evaluate(source))
            .unwrap_or_else(|fault| Err(EvaluationError(fault)));
        let error = match evaluated {
            Ok(()) => {
                self.enter(SessionPhase::Succeeded);
                None
            }
            Err(error) => {
                self.enter(SessionPhase::Failed);
                debug!(source = %digest, %error, "evaluation failed");
                Some(error)
            }
        };

        let outcome = SessionOutcome::Completed {
            stdout: self.streams.stdout.take(),
            stderr: self.streams.stderr.take(),
            error,
        };
        self.enter(SessionPhase::Done);
        outcome
    }

    fn enter(&mut self, phase: SessionPhase) {
        trace!(from = ?self.phase, to = ?phase, "session phase");
        self.phase = phase;
    }
}

/// Run one call in a fresh session and render the report.
pub fn evaluate<E: Engine + ?Sized>(engine: &E, source: &str) -> String {
    EvaluationSession::new(engine).run(source).render()
}

/// Run `f`, turning a Rust panic into a fault message.
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| format!("internal interpreter fault: {}", panic_message(&*payload)))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Short SHA-256 prefix identifying a source text in logs.
fn source_digest(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_digest_is_stable() {
        let digest = source_digest("println(1)");
        assert_eq!(digest.len(), 12);
        assert_eq!(digest, source_digest("println(1)"));
        assert_ne!(digest, source_digest("println(2)"));
    }

    #[test]
    fn test_panic_message_forms() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*payload), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*payload), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }

    #[test]
    fn test_guarded_passes_values_through() {
        assert_eq!(guarded(|| 5), Ok(5));
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = EvaluationSession::new(&crate::engine::QuillEngine::default());
        assert_eq!(session.phase(), SessionPhase::Idle);
    }
}
