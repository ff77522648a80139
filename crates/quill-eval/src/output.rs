//! Output sinks for `print`/`eprint` and friends.
//!
//! An interpreter writes to two sinks, one per stream. Embedders that need
//! the text back (the evaluation bridge, tests) hand in an [`OutputBuffer`];
//! the command-line style default writes straight to the process streams.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// In-memory text buffer that captures one output stream.
///
/// Cloning yields another handle to the same buffer, so the embedder keeps
/// one handle and gives the other to the interpreter.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    inner: Arc<Mutex<String>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text without a trailing newline.
    pub fn write(&self, text: &str) {
        self.inner.lock().push_str(text);
    }

    /// A copy of everything written so far.
    pub fn contents(&self) -> String {
        self.inner.lock().clone()
    }

    /// Move the captured text out, leaving the buffer empty.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.inner.lock())
    }
}

/// Destination for one output stream, dispatched by enum rather than a
/// trait object.
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    /// The process's standard output.
    #[default]
    Stdout,
    /// The process's standard error.
    Stderr,
    /// Captured into a buffer.
    Buffer(OutputBuffer),
}

impl OutputSink {
    pub fn write(&self, text: &str) {
        match self {
            // Write failures on the process streams are not program errors.
            Self::Stdout => {
                let _ = std::io::stdout().lock().write_all(text.as_bytes());
            }
            Self::Stderr => {
                let _ = std::io::stderr().lock().write_all(text.as_bytes());
            }
            Self::Buffer(buffer) => buffer.write(text),
        }
    }
}

impl From<OutputBuffer> for OutputSink {
    fn from(buffer: OutputBuffer) -> Self {
        Self::Buffer(buffer)
    }
}
