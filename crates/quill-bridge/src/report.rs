//! Combined output report.
//!
//! Layout, in order:
//! 1. stdout, verbatim
//! 2. `"\n--- STDERR ---\n"` + stderr, only when stderr is non-empty
//! 3. `"\n--- ERROR ---\n"` + message, only when evaluation failed
//!
//! A library load failure replaces the whole report with
//! `"Error loading standard library: "` + message.

use crate::session::SessionOutcome;

pub const STDERR_DELIMITER: &str = "\n--- STDERR ---\n";
pub const ERROR_DELIMITER: &str = "\n--- ERROR ---\n";
pub const LIBRARY_ERROR_PREFIX: &str = "Error loading standard library: ";

pub fn render(outcome: &SessionOutcome) -> String {
    match outcome {
        SessionOutcome::LoadFailed(error) => format!("{LIBRARY_ERROR_PREFIX}{error}"),
        SessionOutcome::Completed {
            stdout,
            stderr,
            error,
        } => combine(stdout, stderr, error.as_ref().map(|e| e.0.as_str())),
    }
}

/// Join captured streams and an optional error message.
pub fn combine(stdout: &str, stderr: &str, error: Option<&str>) -> String {
    let error_len = error.map_or(0, |e| ERROR_DELIMITER.len() + e.len());
    let mut report =
        String::with_capacity(stdout.len() + STDERR_DELIMITER.len() + stderr.len() + error_len);
    report.push_str(stdout);
    if !stderr.is_empty() {
        report.push_str(STDERR_DELIMITER);
        report.push_str(stderr);
    }
    if let Some(message) = error {
        report.push_str(ERROR_DELIMITER);
        report.push_str(message);
    }
    report
}
