use serde::{Deserialize, Serialize};

use crate::config::API_PREFIX;

use super::error::ApiError;
use super::http::Http;

/// Client for the storage routes. The service only exposes reads; which
/// storages are visible depends on the caller's groups.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: Http,
}

impl StorageClient {
    pub fn new(rest_server_uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Http::new(rest_server_uri, token),
        }
    }

    pub(crate) fn from_http(http: Http) -> Self {
        Self { http }
    }

    /// Lists the storages visible to the calling user.
    pub async fn list(&self) -> Result<StorageList, ApiError> {
        self.http.get(&format!("{}/storages", API_PREFIX)).await
    }

    /// Fetches one storage by name.
    pub async fn get(&self, name: &str) -> Result<StorageDetail, ApiError> {
        self.http
            .get(&format!("{}/storages/{}", API_PREFIX, name))
            .await
    }
}

/// Response of `GET /api/v2/storages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageList {
    #[serde(default)]
    pub storages: Vec<StorageSummary>,
}

/// One entry of the storage list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub name: String,
    #[serde(rename = "type", default)]
    pub storage_type: String,
    #[serde(default)]
    pub share: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_name: Option<String>,
}

/// Response of `GET /api/v2/storages/{storage}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDetail {
    pub name: String,
    #[serde(rename = "type", default)]
    pub storage_type: String,
    #[serde(default)]
    pub share: bool,
    /// Backend-specific connection data, shape varies per storage type.
    #[serde(default)]
    pub data: serde_json::Value,
}
