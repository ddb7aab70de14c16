//! Engine limits and runtime options, loadable from TOML
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Operand stack depth
    pub stack_size: usize,
    /// Simultaneously pending events
    pub max_events: usize,
    /// Nested DESCRIBE depth
    pub max_describe_depth: usize,
    /// Literals accepted in one command
    pub max_literals: usize,
    /// Nested CALL depth
    pub max_call_depth: usize,
    /// Fixed seed for reproducible RND results
    pub random_seed: Option<u64>,
    /// Log every executed instruction at debug level
    pub trace: bool,
    pub save_directory: String,
    pub save_extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            stack_size: 1000,
            max_events: 100,
            max_describe_depth: 25,
            max_literals: 10,
            max_call_depth: 64,
            random_seed: None,
            trace: false,
            save_directory: ".".to_string(),
            save_extension: "sav".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| format!("Invalid configuration: {e}"))
    }

    /// Load a configuration file; a missing file means defaults
    pub fn load(path: &Path) -> Result<Self, String> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(format!("Cannot read {}: {e}", path.display())),
        }
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string(self).map_err(|e| format!("Cannot serialize configuration: {e}"))
    }

    /// Apply environment overrides (`ALANVM_TRACE`)
    pub fn with_env(mut self) -> Self {
        if std::env::var("ALANVM_TRACE").is_ok() {
            self.trace = true;
        }
        self
    }
}
