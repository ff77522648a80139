//! Quill evaluation bridge.
//!
//! A host submits source text and gets back one synchronous text report.
//! Every call runs in a fresh [`EvaluationSession`]: a new interpreter, two
//! private output buffers, the standard library, then the source. The
//! outcome is rendered by [`report::render`].
//!
//! # Usage
//!
//! ```no_run
//! use quill_bridge::{Bridge, BridgeConfig, Keeper};
//! # struct StubHost;
//! # impl quill_bridge::Host for StubHost {
//! #     fn publish(&mut self, _: &str, _: quill_bridge::EntryPoint) -> Result<(), quill_bridge::HostError> { unimplemented!() }
//! #     fn announce(&mut self, _: &str) { unimplemented!() }
//! # }
//! # fn host() -> impl quill_bridge::Host { StubHost }
//!
//! let keeper = Keeper::new();
//! let mut bridge = Bridge::new(BridgeConfig::default());
//! let mut host = host();
//! bridge.register(&mut host, &keeper)?;
//! keeper.hold();
//! # Ok::<(), quill_bridge::BridgeError>(())
//! ```

pub mod bridge;
pub mod config;
pub mod engine;
pub mod keeper;
pub mod report;
pub mod session;

pub use bridge::{Bridge, BridgeError, EntryPoint, Host, HostError};
pub use config::{BridgeConfig, ConfigError, EngineConfig};
pub use engine::{Engine, EvaluationError, Interpreter, LibraryLoadError, QuillEngine, Streams};
pub use keeper::{Keeper, KeeperHandle, KeeperState};
pub use session::{evaluate, EvaluationSession, SessionOutcome, SessionPhase};
