use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::API_PREFIX;

use super::error::ApiError;
use super::http::Http;

/// Client for the virtual-cluster routes. Both routes are read-only.
#[derive(Debug, Clone)]
pub struct VirtualClusterClient {
    http: Http,
}

impl VirtualClusterClient {
    pub fn new(rest_server_uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Http::new(rest_server_uri, token),
        }
    }

    pub(crate) fn from_http(http: Http) -> Self {
        Self { http }
    }

    /// Lists virtual clusters, keyed by name. Every cluster has at least
    /// the `default` entry.
    pub async fn list(&self) -> Result<BTreeMap<String, VirtualCluster>, ApiError> {
        self.http
            .get(&format!("{}/virtual-clusters", API_PREFIX))
            .await
    }

    /// Fetches one virtual cluster by name.
    pub async fn get(&self, name: &str) -> Result<VirtualCluster, ApiError> {
        self.http
            .get(&format!("{}/virtual-clusters/{}", API_PREFIX, name))
            .await
    }
}

/// Capacity snapshot of one virtual cluster. Fields default to zero
/// because schedulers differ in what they report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualCluster {
    #[serde(default)]
    pub capacity: f64,
    #[serde(default)]
    pub max_capacity: f64,
    #[serde(default)]
    pub used_capacity: f64,
    #[serde(default)]
    pub num_active_jobs: u64,
    #[serde(default)]
    pub num_jobs: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dedicated: bool,
}
