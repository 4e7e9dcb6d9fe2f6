use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::API_PREFIX;

use super::error::ApiError;
use super::http::Http;
use super::ApiMessage;

/// Client for the user-management routes. Mutating routes require an
/// admin token, except password/email updates on the caller's own
/// account.
#[derive(Debug, Clone)]
pub struct UserClient {
    http: Http,
}

impl UserClient {
    pub fn new(rest_server_uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Http::new(rest_server_uri, token),
        }
    }

    pub(crate) fn from_http(http: Http) -> Self {
        Self { http }
    }

    /// Creates a user.
    pub async fn create(&self, user: &UserRequest) -> Result<ApiMessage, ApiError> {
        self.http
            .post_json(&format!("{}/users", API_PREFIX), user)
            .await
    }

    /// Lists all users.
    pub async fn list(&self) -> Result<Vec<UserInfo>, ApiError> {
        self.http.get(&format!("{}/users", API_PREFIX)).await
    }

    /// Fetches one user by name.
    pub async fn get(&self, username: &str) -> Result<UserInfo, ApiError> {
        self.http
            .get(&format!("{}/users/{}", API_PREFIX, username))
            .await
    }

    pub async fn update_email(&self, username: &str, email: &str) -> Result<ApiMessage, ApiError> {
        self.http
            .put_json(
                &format!("{}/users/{}/email", API_PREFIX, username),
                &json!({ "email": email }),
            )
            .await
    }

    /// Changes a password. `old_password` is required unless the caller
    /// is an admin.
    pub async fn update_password(
        &self,
        username: &str,
        old_password: Option<&str>,
        new_password: &str,
    ) -> Result<ApiMessage, ApiError> {
        let mut body = json!({ "newPassword": new_password });
        if let Some(old) = old_password {
            body["oldPassword"] = json!(old);
        }
        self.http
            .put_json(&format!("{}/users/{}/password", API_PREFIX, username), &body)
            .await
    }

    pub async fn update_admin(&self, username: &str, admin: bool) -> Result<ApiMessage, ApiError> {
        self.http
            .put_json(
                &format!("{}/users/{}/admin", API_PREFIX, username),
                &json!({ "admin": admin }),
            )
            .await
    }

    /// Replaces the user's virtual-cluster list.
    pub async fn update_virtual_clusters(
        &self,
        username: &str,
        virtual_clusters: &[String],
    ) -> Result<ApiMessage, ApiError> {
        self.http
            .put_json(
                &format!("{}/users/{}/virtualcluster", API_PREFIX, username),
                &json!({ "virtualCluster": virtual_clusters }),
            )
            .await
    }

    /// Deletes a user.
    pub async fn delete(&self, username: &str) -> Result<ApiMessage, ApiError> {
        self.http
            .delete(&format!("{}/users/{}", API_PREFIX, username))
            .await
    }
}

/// Body of `POST /api/v2/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_cluster: Option<Vec<String>>,
}

/// A user record as the service reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub virtual_cluster: Vec<String>,
    #[serde(default)]
    pub grouplist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<serde_json::Value>,
}
