//! Configuration management for the RBAC engine
//!
//! Configuration can be loaded from a YAML file or from environment
//! variables; embedding services may also build it programmatically.

use crate::utils::error::{RbacError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// RBAC behavior configuration
    #[serde(default)]
    pub rbac: RbacConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RbacError::config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| RbacError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Recognized variables: `RBAC_DEFAULT_ROLE`, `RBAC_ENFORCE_EXPIRATION`,
    /// `RBAC_TREE_FETCH_LIMIT`.
    pub fn from_env() -> Result<Self> {
        let mut rbac = RbacConfig::default();

        if let Ok(role) = std::env::var("RBAC_DEFAULT_ROLE") {
            rbac.default_role = role;
        }
        if let Ok(value) = std::env::var("RBAC_ENFORCE_EXPIRATION") {
            rbac.enforce_expiration = value == "1" || value.eq_ignore_ascii_case("true");
        }
        if let Ok(value) = std::env::var("RBAC_TREE_FETCH_LIMIT") {
            rbac.tree_fetch_limit = value.parse().map_err(|_| {
                RbacError::config(format!("Invalid RBAC_TREE_FETCH_LIMIT: {}", value))
            })?;
        }

        let config = Config { rbac };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rbac.default_role.is_empty() {
            return Err(RbacError::config("rbac.default_role cannot be empty"));
        }
        if self.rbac.tree_fetch_limit == 0 {
            return Err(RbacError::config("rbac.tree_fetch_limit must be positive"));
        }
        Ok(())
    }
}

/// RBAC behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Role code granted to users with no explicit binding
    #[serde(default = "default_role")]
    pub default_role: String,
    /// Treat bindings past `expires_at` as inactive during resolution.
    /// When false (the default), `expires_at` is advisory and an external
    /// sweep is expected to deactivate expired bindings.
    #[serde(default)]
    pub enforce_expiration: bool,
    /// Maximum number of active menus fetched when building the menu tree
    #[serde(default = "default_tree_fetch_limit")]
    pub tree_fetch_limit: usize,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            default_role: default_role(),
            enforce_expiration: false,
            tree_fetch_limit: default_tree_fetch_limit(),
        }
    }
}

fn default_role() -> String {
    "user".to_string()
}

fn default_tree_fetch_limit() -> usize {
    1000
}
