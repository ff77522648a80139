//! Host bridge registration.
//!
//! The bridge exposes exactly one host-callable entry point: source text
//! in, report text out. Each call runs a fresh session, so calls never
//! observe each other.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::config::{BridgeConfig, ConfigError};
use crate::engine::{Engine, QuillEngine};
use crate::keeper::Keeper;
use crate::session;

/// The callable handed to the host.
pub type EntryPoint = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// The embedding environment: somewhere to publish the entry point and
/// somewhere to write the readiness line.
pub trait Host {
    fn publish(&mut self, name: &str, entry: EntryPoint) -> Result<(), HostError>;

    fn announce(&mut self, line: &str);
}

/// The host refused or failed to publish the entry point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("entry point '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("failed to publish entry point '{name}': {source}")]
    Publish { name: String, source: HostError },
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

pub struct Bridge<E = QuillEngine> {
    config: BridgeConfig,
    engine: Arc<E>,
    registered: bool,
}

impl Bridge<QuillEngine> {
    /// A bridge over the Quill interpreter, with guards from `config.engine`.
    pub fn new(config: BridgeConfig) -> Self {
        let engine = QuillEngine::from_config(&config.engine);
        Self::with_engine(config, engine)
    }
}

impl<E> Bridge<E>
where
    E: Engine + Send + Sync + 'static,
{
    pub fn with_engine(config: BridgeConfig, engine: E) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
            registered: false,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn entry_point_name(&self) -> &str {
        &self.config.entry_point
    }

    /// Rename the entry point. Only allowed before registration, and the
    /// name must not be blank.
    pub fn set_entry_point_name(&mut self, name: impl Into<String>) -> Result<(), BridgeError> {
        if self.registered {
            return Err(BridgeError::AlreadyRegistered(self.config.entry_point.clone()));
        }
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyEntryPoint.into());
        }
        self.config.entry_point = name;
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The callable that runs one evaluation per invocation.
    pub fn entry_point(&self) -> EntryPoint {
        let engine = Arc::clone(&self.engine);
        Arc::new(move |source: &str| session::evaluate(&*engine, source))
    }

    /// Validate the configuration, publish the entry point, announce
    /// readiness, then mark the keeper ready.
    ///
    /// Nothing is published for an invalid configuration, and nothing is
    /// announced if publishing fails.
    pub fn register<H>(&mut self, host: &mut H, keeper: &Keeper) -> Result<(), BridgeError>
    where
        H: Host + ?Sized,
    {
        let name = self.config.entry_point.clone();
        if self.registered {
            return Err(BridgeError::AlreadyRegistered(name));
        }
        self.config.validate()?;
        host.publish(&name, self.entry_point())
            .map_err(|source| BridgeError::Publish {
                name: name.clone(),
                source,
            })?;
        self.registered = true;
        info!(entry_point = %name, "entry point registered");

        host.announce(&self.config.readiness_message);
        keeper.mark_ready();
        Ok(())
    }
}

impl<E> fmt::Debug for Bridge<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}
