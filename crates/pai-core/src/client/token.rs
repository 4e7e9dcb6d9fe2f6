use serde::{Deserialize, Serialize};

use crate::config::API_PREFIX;

use super::error::ApiError;
use super::http::Http;
use super::ApiMessage;

/// Client for the token-management routes.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: Http,
}

impl TokenClient {
    pub fn new(rest_server_uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Http::new(rest_server_uri, token),
        }
    }

    pub(crate) fn from_http(http: Http) -> Self {
        Self { http }
    }

    /// Lists every token of the calling user.
    pub async fn list(&self) -> Result<TokenList, ApiError> {
        self.http.get(&format!("{}/tokens", API_PREFIX)).await
    }

    /// Creates a long-lived application token for the calling user.
    pub async fn create_application_token(&self) -> Result<ApplicationToken, ApiError> {
        self.http
            .post_empty(&format!("{}/tokens/application", API_PREFIX))
            .await
    }

    /// Revokes one token by its literal value.
    pub async fn revoke(&self, token: &str) -> Result<ApiMessage, ApiError> {
        self.http
            .delete(&format!("{}/tokens/{}", API_PREFIX, token))
            .await
    }
}

/// Response of `GET /api/v2/tokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// Response of `POST /api/v2/tokens/application`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationToken {
    pub token: String,
    #[serde(default)]
    pub application: bool,
}
