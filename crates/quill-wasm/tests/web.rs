//! Browser tests; run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn start_registers_global_entry_point() {
    // Registration may already have happened at instantiation.
    let _ = quill_wasm::start();
    assert!(quill_wasm::is_ready());

    let global = js_sys::global();
    let entry = js_sys::Reflect::get(&global, &JsValue::from_str("runQuillCode")).unwrap();
    let entry: js_sys::Function = entry.dyn_into().unwrap();
    let report = entry
        .call1(&JsValue::NULL, &JsValue::from_str("println(1 + 1)"))
        .unwrap();
    assert_eq!(report.as_string().as_deref(), Some("2\n"));
}

#[wasm_bindgen_test]
fn run_quill_code_reports_errors() {
    assert_eq!(
        quill_wasm::run_quill_code("println(nope)"),
        "\n--- ERROR ---\nruntime error at 1:9: undefined variable 'nope'"
    );
}
