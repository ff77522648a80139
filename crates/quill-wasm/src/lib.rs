//! Quill evaluation bridge as a WASM module for browser environments.
//!
//! On instantiation the module registers `globalThis.runQuillCode` and logs
//! `Quill interpreter initialized` to the console. The JS event loop keeps
//! the instance resident afterwards.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init from 'quill-wasm';
//!
//! await init();
//!
//! const report = globalThis.runQuillCode('println("hello")');
//! // "hello\n"
//! ```

use std::cell::RefCell;
use std::sync::Once;

use quill_bridge::{Bridge, BridgeConfig, EntryPoint, Host, HostError, Keeper};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(message: &str);
}

thread_local! {
    static KEEPER: Keeper = Keeper::new();
    /// The module's one bridge: `start` registers it, `run_quill_code` calls
    /// its entry point.
    static BRIDGE: RefCell<Bridge> = RefCell::new(Bridge::new(BridgeConfig::default()));
}

static PANIC_HOOK: Once = Once::new();

/// Publishes entry points on `globalThis` and announces on the console.
struct JsHost;

impl Host for JsHost {
    fn publish(&mut self, name: &str, entry: EntryPoint) -> Result<(), HostError> {
        let callback =
            Closure::<dyn Fn(String) -> String>::new(move |source: String| entry(&source));
        js_sys::Reflect::set(&js_sys::global(), &JsValue::from_str(name), callback.as_ref())
            .map_err(|e| HostError::new(format!("{e:?}")))?;
        // The global keeps the function for the lifetime of the page.
        callback.forget();
        Ok(())
    }

    fn announce(&mut self, line: &str) {
        log(line);
    }
}

/// Route Rust panics to `console.log` instead of an opaque trap message.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        std::panic::set_hook(Box::new(|info| log(&info.to_string())));
    });
}

/// Module start: register the entry point and announce readiness.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    install_panic_hook();
    BRIDGE
        .with(|bridge| KEEPER.with(|keeper| bridge.borrow_mut().register(&mut JsHost, keeper)))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Evaluate Quill source and return the combined report.
///
/// Calls the same entry point that `start` publishes as
/// `globalThis.runQuillCode`, for callers that prefer module imports.
#[wasm_bindgen]
pub fn run_quill_code(source: &str) -> String {
    let entry = entry_point();
    entry(source)
}

fn entry_point() -> EntryPoint {
    BRIDGE.with(|bridge| bridge.borrow().entry_point())
}

/// Whether the entry point has been registered.
#[wasm_bindgen]
pub fn is_ready() -> bool {
    KEEPER.with(Keeper::is_ready)
}

/// Return the bridge version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// The bridge's configuration as JSON.
#[wasm_bindgen]
pub fn config() -> String {
    BRIDGE
        .with(|bridge| serde_json::to_string(bridge.borrow().config()))
        .unwrap_or_else(|e| format!(r#"{{"error":"Serialization error: {e}"}}"#))
}
