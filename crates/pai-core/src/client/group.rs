use serde::{Deserialize, Serialize};

use crate::config::API_PREFIX;

use super::error::ApiError;
use super::http::Http;
use super::ApiMessage;

/// Client for the group-management routes. All mutations require an
/// admin token.
#[derive(Debug, Clone)]
pub struct GroupClient {
    http: Http,
}

impl GroupClient {
    pub fn new(rest_server_uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Http::new(rest_server_uri, token),
        }
    }

    pub(crate) fn from_http(http: Http) -> Self {
        Self { http }
    }

    /// Creates a group.
    pub async fn create(&self, group: &GroupRequest) -> Result<ApiMessage, ApiError> {
        self.http
            .post_json(&format!("{}/groups", API_PREFIX), group)
            .await
    }

    /// Lists all groups.
    pub async fn list(&self) -> Result<Vec<GroupInfo>, ApiError> {
        self.http.get(&format!("{}/groups", API_PREFIX)).await
    }

    /// Fetches one group by name.
    pub async fn get(&self, groupname: &str) -> Result<GroupInfo, ApiError> {
        self.http
            .get(&format!("{}/groups/{}", API_PREFIX, groupname))
            .await
    }

    /// Updates a group. With `patch` set, only the fields present in
    /// `data` change; otherwise the group is replaced.
    pub async fn update(&self, update: &GroupUpdate) -> Result<ApiMessage, ApiError> {
        self.http
            .put_json(&format!("{}/groups", API_PREFIX), update)
            .await
    }

    /// Deletes a group.
    pub async fn delete(&self, groupname: &str) -> Result<ApiMessage, ApiError> {
        self.http
            .delete(&format!("{}/groups/{}", API_PREFIX, groupname))
            .await
    }
}

/// Body of `POST /api/v2/groups` and the `data` half of an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub groupname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<serde_json::Value>,
}

/// A group record as the service reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub groupname: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_name: Option<String>,
    #[serde(default)]
    pub extension: serde_json::Value,
}

/// Body of `PUT /api/v2/groups`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupUpdate {
    pub data: GroupRequest,
    pub patch: bool,
}
