//! Local registry of known clusters, kept under `~/.pai/clusters.json`.
//!
//! The file is a JSON array of cluster descriptors with an extra
//! `alias` field, so it can double as a `PAI_CLUSTER_FILE` fixture
//! (the core config loader ignores the alias).

use std::path::{Path, PathBuf};

use pai_core::ClusterConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{read_json_or, write_json, UtilError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Could not locate a home directory for the registry")]
    NoHome,

    #[error("No clusters are registered; run `pai cluster add` first")]
    Empty,

    #[error("No cluster registered under alias `{0}`")]
    UnknownAlias(String),

    #[error("A cluster is already registered under alias `{0}`")]
    DuplicateAlias(String),

    #[error(transparent)]
    Util(#[from] UtilError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredCluster {
    pub alias: String,
    #[serde(flatten)]
    pub config: ClusterConfig,
}

#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    path: PathBuf,
}

impl ClusterRegistry {
    /// Registry at the default location under the home directory.
    pub fn default_path() -> Result<Self, RegistryError> {
        let home = dirs::home_dir().ok_or(RegistryError::NoHome)?;
        Ok(Self {
            path: home.join(".pai").join("clusters.json"),
        })
    }

    /// Registry backed by an explicit file, used by tests.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All registered clusters; an absent or unreadable file is an
    /// empty registry.
    pub fn list(&self) -> Vec<RegisteredCluster> {
        read_json_or(&self.path, Vec::new())
    }

    pub fn get(&self, alias: &str) -> Result<RegisteredCluster, RegistryError> {
        self.list()
            .into_iter()
            .find(|c| c.alias == alias)
            .ok_or_else(|| RegistryError::UnknownAlias(alias.to_string()))
    }

    /// The first registered cluster, used when no alias is given.
    pub fn default_cluster(&self) -> Result<RegisteredCluster, RegistryError> {
        let mut clusters = self.list();
        if clusters.is_empty() {
            return Err(RegistryError::Empty);
        }
        Ok(clusters.swap_remove(0))
    }

    pub fn add(&self, cluster: RegisteredCluster) -> Result<(), RegistryError> {
        let mut clusters = self.list();
        if clusters.iter().any(|c| c.alias == cluster.alias) {
            return Err(RegistryError::DuplicateAlias(cluster.alias));
        }
        clusters.push(cluster);
        write_json(&self.path, &clusters)?;
        Ok(())
    }

    pub fn remove(&self, alias: &str) -> Result<(), RegistryError> {
        let mut clusters = self.list();
        let before = clusters.len();
        clusters.retain(|c| c.alias != alias);
        if clusters.len() == before {
            return Err(RegistryError::UnknownAlias(alias.to_string()));
        }
        write_json(&self.path, &clusters)?;
        Ok(())
    }
}
