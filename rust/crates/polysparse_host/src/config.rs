use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HostError, Result};

/// Environment variable capping the number of live handles
pub const HANDLE_LIMIT_ENV: &str = "POLYSPARSE_HANDLE_LIMIT";

/// Host session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of live handles, unlimited when absent
    pub handle_limit: Option<usize>,

    /// Slots reserved up front in the handle table
    pub initial_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handle_limit: None,
            initial_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| HostError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| HostError::Config(e.to_string()))
    }

    /// Apply `POLYSPARSE_HANDLE_LIMIT` on top of `self`
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var(HANDLE_LIMIT_ENV) {
            let limit = value
                .trim()
                .parse::<usize>()
                .map_err(|_| {
                    HostError::Config(format!("{}={:?} is not a count", HANDLE_LIMIT_ENV, value))
                })?;
            self.handle_limit = Some(limit);
        }
        Ok(self)
    }
}
