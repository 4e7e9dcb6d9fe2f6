//! Typed clients for the rest-server API.
//!
//! One sub-client per API tag, all sharing the [`Http`] plumbing:
//! bearer-token auth, `{code, message}` error decoding, JSON and
//! text/yaml bodies. [`PaiClient`] bundles them for one cluster.

mod authn;
mod error;
mod group;
mod http;
mod job;
mod storage;
mod token;
mod user;
mod virtual_cluster;

pub use authn::{AuthnClient, AuthnInfo, LoginInfo};
pub use error::ApiError;
pub use group::{GroupClient, GroupInfo, GroupRequest, GroupUpdate};
pub use job::{
    JobAttempt, JobClient, JobDetail, JobExecutionType, JobListItem, JobStatusInfo,
};
pub use storage::{StorageClient, StorageDetail, StorageList, StorageSummary};
pub use token::{ApplicationToken, TokenClient, TokenList};
pub use user::{UserClient, UserInfo, UserRequest};
pub use virtual_cluster::{VirtualCluster, VirtualClusterClient};

use serde::{Deserialize, Serialize};

use crate::config::ClusterConfig;

use http::Http;

/// Standard `{message}` body returned by mutating routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: String,
}

/// Aggregate client for one cluster. Construct it once from a
/// [`ClusterConfig`], then borrow per-tag sub-clients as needed.
#[derive(Debug, Clone)]
pub struct PaiClient {
    http: Http,
}

impl PaiClient {
    pub fn new(config: &ClusterConfig) -> Self {
        Self::with_token(&config.rest_server_uri, &config.token)
    }

    /// Builds a client for an explicit URI and token, bypassing any
    /// cluster configuration.
    pub fn with_token(rest_server_uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Http::new(rest_server_uri, token),
        }
    }

    pub fn authn(&self) -> AuthnClient {
        AuthnClient::from_http(self.http.clone())
    }

    pub fn token(&self) -> TokenClient {
        TokenClient::from_http(self.http.clone())
    }

    pub fn user(&self) -> UserClient {
        UserClient::from_http(self.http.clone())
    }

    pub fn group(&self) -> GroupClient {
        GroupClient::from_http(self.http.clone())
    }

    pub fn virtual_cluster(&self) -> VirtualClusterClient {
        VirtualClusterClient::from_http(self.http.clone())
    }

    pub fn storage(&self) -> StorageClient {
        StorageClient::from_http(self.http.clone())
    }

    pub fn job(&self) -> JobClient {
        JobClient::from_http(self.http.clone())
    }
}
