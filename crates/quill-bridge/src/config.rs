//! Bridge configuration.
//!
//! Every field has a default, so `{}` (or no file at all) is a valid
//! configuration.

use serde::{Deserialize, Serialize};

/// Name of the host-callable entry point.
pub const DEFAULT_ENTRY_POINT: &str = "runQuillCode";

/// Line announced once the entry point is registered.
pub const DEFAULT_READINESS_MESSAGE: &str = "Quill interpreter initialized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub entry_point: String,
    pub readiness_message: String,
    pub engine: EngineConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            readiness_message: DEFAULT_READINESS_MESSAGE.to_string(),
            engine: EngineConfig::default(),
        }
    }
}

/// Interpreter guards applied to every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub max_call_depth: usize,
    /// `None` leaves evaluation unbounded.
    pub step_limit: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: quill_eval::DEFAULT_MAX_CALL_DEPTH,
            step_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(String),
    #[error("entry point name must not be empty")]
    EmptyEntryPoint,
    #[error("engine.max_call_depth must be at least 1")]
    ZeroCallDepth,
}

impl BridgeConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_point.trim().is_empty() {
            return Err(ConfigError::EmptyEntryPoint);
        }
        if self.engine.max_call_depth == 0 {
            return Err(ConfigError::ZeroCallDepth);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.entry_point, "runQuillCode");
        assert_eq!(config.readiness_message, "Quill interpreter initialized");
        assert_eq!(config.engine.max_call_depth, 200);
        assert_eq!(config.engine.step_limit, None);
    }

    #[test]
    fn test_partial_engine_section() {
        let config = BridgeConfig::from_json(r#"{"engine": {"step_limit": 5000}}"#).unwrap();
        assert_eq!(config.engine.step_limit, Some(5000));
        assert_eq!(config.engine.max_call_depth, 200);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = BridgeConfig::from_json(r#"{"entrypoint": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            BridgeConfig::from_json(r#"{"entry_point": "  "}"#),
            Err(ConfigError::EmptyEntryPoint)
        );
        assert_eq!(
            BridgeConfig::from_json(r#"{"engine": {"max_call_depth": 0}}"#),
            Err(ConfigError::ZeroCallDepth)
        );
    }
}
