//! Tests for the stdio host: protocol framing, registration, and shutdown
//! on end of input.

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use quill_bridge::{Bridge, BridgeConfig, Host, Keeper, KeeperState};
use quill_host::protocol::serve_lines;
use quill_host::{load_config, StdioHost};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// A `Write` whose contents stay readable after it moves to another thread.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Register a bridge on a stdio host fed with `input`, hold until input is
/// exhausted, and return (stdout, stderr).
fn serve(input: &str) -> (String, String) {
    let keeper = Keeper::new();
    let output = SharedBuf::default();
    let announce = SharedBuf::default();
    let mut host = StdioHost::new(
        Cursor::new(input.to_string()),
        output.clone(),
        announce.clone(),
        keeper.handle(),
    );
    let mut bridge = Bridge::new(BridgeConfig::default());
    bridge.register(&mut host, &keeper).unwrap();
    let handle = keeper.handle();
    keeper.hold();
    host.join();
    assert_eq!(handle.state(), KeeperState::Stopped);
    (output.text(), announce.text())
}

fn lines(text: &str) -> Vec<serde_json::Value> {
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Serving
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_readiness_line_on_stderr() {
    let (stdout, stderr) = serve("");
    assert_eq!(stdout, "");
    assert_eq!(stderr, "Quill interpreter initialized\n");
}

#[test]
fn test_one_response_per_request() {
    let input = concat!(
        r#"{"id": 1, "source": "println(\"hello\")"}"#,
        "\n",
        "\n",
        r#"{"id": "b", "source": "eprint(\"w\")"}"#,
        "\n",
    );
    let (stdout, _) = serve(input);
    assert_eq!(
        lines(&stdout),
        vec![
            serde_json::json!({"id": 1, "output": "hello\n"}),
            serde_json::json!({"id": "b", "output": "\n--- STDERR ---\nw"}),
        ]
    );
}

#[test]
fn test_malformed_line_keeps_serving() {
    let input = "not json\n{\"source\": \"print(2)\"}\n";
    let (stdout, _) = serve(input);
    let responses = lines(&stdout);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], serde_json::Value::Null);
    assert!(responses[0]["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid request: "));
    assert_eq!(responses[1], serde_json::json!({"id": null, "output": "2"}));
}

#[test]
fn test_requests_are_isolated() {
    let input = concat!(
        r#"{"id": 1, "source": "let x = 1"}"#,
        "\n",
        r#"{"id": 2, "source": "println(x)"}"#,
        "\n",
    );
    let (stdout, _) = serve(input);
    let responses = lines(&stdout);
    assert_eq!(responses[0]["output"], "");
    assert_eq!(
        responses[1]["output"],
        "\n--- ERROR ---\nruntime error at 1:9: undefined variable 'x'"
    );
}

#[test]
fn test_serve_lines_counts_answers() {
    let entry: quill_bridge::EntryPoint = Arc::new(|source: &str| source.to_uppercase());
    let mut output = Vec::new();
    let answered = serve_lines(
        Cursor::new("{\"source\": \"abc\"}\n\n{\"id\": 9, \"source\": \"x\"}\n"),
        &mut output,
        &entry,
    )
    .unwrap();
    assert_eq!(answered, 2);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "{\"id\":null,\"output\":\"ABC\"}\n{\"id\":9,\"output\":\"X\"}\n"
    );
}

#[test]
fn test_second_publish_is_refused() {
    let keeper = Keeper::new();
    let mut host = StdioHost::new(Cursor::new(String::new()), Vec::new(), Vec::new(), keeper.handle());
    let entry: quill_bridge::EntryPoint = Arc::new(|_: &str| String::new());
    host.publish("a", entry.clone()).unwrap();
    assert!(host.publish("b", entry).is_err());
    host.join();
}

// ══════════════════════════════════════════════════════════════════════════════
// Configuration
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_config_file_means_defaults() {
    let path = std::env::temp_dir().join("quill-host-tests-does-not-exist.json");
    assert_eq!(load_config(&path).unwrap(), BridgeConfig::default());
}

#[test]
fn test_config_file_is_read_and_validated() {
    let dir = std::env::temp_dir().join(format!("quill-host-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let good = dir.join("good.json");
    std::fs::write(&good, r#"{"readiness_message": "up", "engine": {"step_limit": 10}}"#).unwrap();
    let config = load_config(&good).unwrap();
    assert_eq!(config.readiness_message, "up");
    assert_eq!(config.engine.step_limit, Some(10));

    let bad = dir.join("bad.json");
    std::fs::write(&bad, r#"{"entry_point": ""}"#).unwrap();
    let err = load_config(&bad).unwrap_err();
    assert!(format!("{err:#}").contains("entry point name must not be empty"));

    std::fs::remove_dir_all(&dir).unwrap();
}
