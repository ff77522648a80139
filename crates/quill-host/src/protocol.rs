//! Line-delimited JSON protocol.
//!
//! Request, one per line:
//! ```json
//! {"id": 7, "source": "println(\"hi\")"}
//! ```
//! Response, one per request line:
//! ```json
//! {"id": 7, "output": "hi\n"}
//! ```
//! `id` is any JSON value and is echoed back; it defaults to `null`.
//! A line that is not a valid request gets
//! `{"id": null, "error": "invalid request: ..."}`. Blank lines are ignored.

use std::io::{self, BufRead, Write};

use quill_bridge::EntryPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: serde_json::Value,
    pub source: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Response {
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn output(id: serde_json::Value, output: String) -> Self {
        Self {
            id,
            output: Some(output),
            error: None,
        }
    }

    pub fn invalid(message: impl std::fmt::Display) -> Self {
        Self {
            id: serde_json::Value::Null,
            output: None,
            error: Some(format!("invalid request: {message}")),
        }
    }
}

/// Answer one input line. `None` for blank lines.
pub fn respond(line: &str, entry: &EntryPoint) -> Option<Response> {
    if line.trim().is_empty() {
        return None;
    }
    Some(match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            let output = entry(&request.source);
            Response::output(request.id, output)
        }
        Err(e) => Response::invalid(e),
    })
}

/// Serve requests until `input` is exhausted. Returns the number of
/// responses written.
pub fn serve_lines<R, W>(input: R, mut output: W, entry: &EntryPoint) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut answered = 0;
    for line in input.lines() {
        let line = line?;
        let Some(response) = respond(&line, entry) else {
            continue;
        };
        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
        answered += 1;
    }
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn echo() -> EntryPoint {
        Arc::new(|source: &str| format!("ran {source}"))
    }

    #[test]
    fn test_response_field_order() {
        let response = Response::output(serde_json::json!(1), "x".into());
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"id":1,"output":"x"}"#
        );
    }

    #[test]
    fn test_missing_id_defaults_to_null() {
        let response = respond(r#"{"source": "a"}"#, &echo()).unwrap();
        assert_eq!(response, Response::output(serde_json::Value::Null, "ran a".into()));
    }

    #[test]
    fn test_blank_line_is_skipped() {
        assert_eq!(respond("   ", &echo()), None);
    }

    #[test]
    fn test_missing_source_is_invalid() {
        let response = respond(r#"{"id": 3}"#, &echo()).unwrap();
        assert_eq!(response.id, serde_json::Value::Null);
        let error = response.error.unwrap();
        assert!(error.starts_with("invalid request: missing field `source`"), "{error}");
    }
}
