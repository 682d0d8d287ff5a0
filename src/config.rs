//! Directory configuration
//!
//! Loaded from a JSON file. Every field is optional and falls back to its
//! default.
//!
//! ```json
//! {
//!     "root_name": "accountdb/accounts",
//!     "root_description": "accountdb accounts root item",
//!     "max_create_attempts": 3
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::accounts::{AccountError, AccountResult};

/// Account directory configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Stable name of the root record all accounts live under
    #[serde(default = "default_root_name")]
    pub root_name: String,

    /// Description recorded when the root record is first created
    #[serde(default = "default_root_description")]
    pub root_description: String,

    /// Account creation attempts before giving up on collisions
    #[serde(default = "default_max_create_attempts")]
    pub max_create_attempts: u32,
}

fn default_root_name() -> String {
    "accountdb/accounts".to_string()
}
fn default_root_description() -> String {
    "accountdb accounts root item".to_string()
}
fn default_max_create_attempts() -> u32 {
    3
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            root_name: default_root_name(),
            root_description: default_root_description(),
            max_create_attempts: default_max_create_attempts(),
        }
    }
}

impl DirectoryConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> AccountResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AccountError::Config(format!("Failed to read config: {}", e)))?;

        let config: DirectoryConfig = serde_json::from_str(&content)
            .map_err(|e| AccountError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> AccountResult<()> {
        if self.root_name.trim().is_empty() {
            return Err(AccountError::Config("root_name must not be empty".to_string()));
        }

        if self.max_create_attempts == 0 {
            return Err(AccountError::Config("max_create_attempts must be > 0".to_string()));
        }

        Ok(())
    }
}
