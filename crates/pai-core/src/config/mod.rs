//! Cluster configuration for pai.
//!
//! A cluster descriptor names one target deployment: the account used to
//! drive it, the REST endpoint, and a pre-provisioned access token. The
//! descriptor is loaded from a JSON fixture file with the following priority:
//! 1. Environment variables (highest priority)
//! 2. The file named by `PAI_CLUSTER_FILE`
//! 3. `./clusters.json`

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read cluster file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse cluster file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Cluster file contains no entries")]
    EmptyFile,

    #[error("Invalid cluster configuration: {0}")]
    Invalid(String),
}

/// Describes one target cluster deployment.
///
/// The fixture file holds a JSON array of these records; callers that do not
/// pick an entry explicitly get element `[0]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Account used to drive the cluster.
    pub username: String,

    /// Password for basic login.
    #[serde(default)]
    pub password: String,

    /// Base URI of the REST server, e.g. `http://10.0.0.1:9186`.
    pub rest_server_uri: String,

    /// Pre-provisioned access token for authenticated routes.
    #[serde(default)]
    pub token: String,
}

impl ClusterConfig {
    /// Load the default cluster descriptor.
    ///
    /// Reads the file named by `PAI_CLUSTER_FILE` (falling back to
    /// `./clusters.json`), takes element `[0]`, then applies environment
    /// variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(ENV_CLUSTER_FILE).unwrap_or_else(|_| DEFAULT_CLUSTER_FILE.to_string());
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the default descriptor (element `[0]`) from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::all_from_file(path)?.swap_remove(0))
    }

    /// Load every descriptor in a fixture file.
    pub fn all_from_file(path: impl AsRef<Path>) -> Result<Vec<Self>, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let clusters: Vec<ClusterConfig> = serde_json::from_str(&content)?;

        if clusters.is_empty() {
            return Err(ConfigError::EmptyFile);
        }

        Ok(clusters)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(username) = std::env::var("PAI_USERNAME") {
            self.username = username;
        }
        if let Ok(password) = std::env::var("PAI_PASSWORD") {
            self.password = password;
        }
        if let Ok(uri) = std::env::var("PAI_REST_SERVER_URI") {
            self.rest_server_uri = uri;
        }
        if let Ok(token) = std::env::var("PAI_TOKEN") {
            self.token = token;
        }
    }

    /// Validates that the fields required to reach the cluster are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rest_server_uri.is_empty() {
            return Err(ConfigError::Invalid("rest_server_uri is empty".into()));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Invalid("username is empty".into()));
        }
        Ok(())
    }
}
