use serde::{Deserialize, Serialize};

use crate::config::{API_PREFIX, DEFAULT_TOKEN_EXPIRATION};

use super::error::ApiError;
use super::http::Http;
use super::ApiMessage;

/// Client for the authentication routes.
#[derive(Debug, Clone)]
pub struct AuthnClient {
    http: Http,
}

impl AuthnClient {
    pub fn new(rest_server_uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Http::new(rest_server_uri, token),
        }
    }

    pub(crate) fn from_http(http: Http) -> Self {
        Self { http }
    }

    /// Fetches the authentication mode of the cluster.
    pub async fn get_info(&self) -> Result<AuthnInfo, ApiError> {
        self.http.get(&format!("{}/authn/info", API_PREFIX)).await
    }

    /// Exchanges a username and password for a fresh bearer token.
    pub async fn basic_login(&self, username: &str, password: &str) -> Result<LoginInfo, ApiError> {
        let form = LoginForm {
            username,
            password,
            expiration: DEFAULT_TOKEN_EXPIRATION,
        };
        self.http
            .post_form(&format!("{}/authn/basic/login", API_PREFIX), &form)
            .await
    }

    /// Revokes the token this client was built with.
    pub async fn basic_logout(&self) -> Result<ApiMessage, ApiError> {
        self.http
            .delete(&format!("{}/authn/basic/logout", API_PREFIX))
            .await
    }
}

#[derive(Debug, Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
    expiration: u32,
}

/// Authentication mode advertised by `GET /api/v2/authn/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnInfo {
    pub authn_type: String,
    #[serde(rename = "loginURI", default, skip_serializing_if = "Option::is_none")]
    pub login_uri: Option<String>,
    #[serde(
        rename = "loginURIMethod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub login_uri_method: Option<String>,
}

/// Session created by a successful basic login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInfo {
    pub token: String,
    pub user: String,
    #[serde(default)]
    pub admin: bool,
}
