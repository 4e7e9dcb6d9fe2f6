use serde::{Deserialize, Serialize};

use crate::config::API_PREFIX;

use super::error::ApiError;
use super::http::Http;
use super::ApiMessage;

/// Client for the job routes. Jobs are addressed as `{username}~{name}`
/// because names are only unique per user.
#[derive(Debug, Clone)]
pub struct JobClient {
    http: Http,
}

impl JobClient {
    pub fn new(rest_server_uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Http::new(rest_server_uri, token),
        }
    }

    pub(crate) fn from_http(http: Http) -> Self {
        Self { http }
    }

    /// Submits a job protocol. The body is the YAML document itself, not
    /// a JSON wrapper; the service accepts it with `202 Accepted` before
    /// the job is scheduled.
    pub async fn submit(&self, protocol_yaml: &str) -> Result<ApiMessage, ApiError> {
        self.http
            .post_yaml(&format!("{}/jobs", API_PREFIX), protocol_yaml)
            .await
    }

    /// Lists jobs, optionally restricted to one user.
    pub async fn list(&self, username: Option<&str>) -> Result<Vec<JobListItem>, ApiError> {
        let path = match username {
            Some(user) => format!("{}/jobs?username={}", API_PREFIX, user),
            None => format!("{}/jobs", API_PREFIX),
        };
        self.http.get(&path).await
    }

    /// Fetches the status of one job.
    pub async fn get(&self, username: &str, name: &str) -> Result<JobDetail, ApiError> {
        self.http
            .get(&format!("{}/jobs/{}~{}", API_PREFIX, username, name))
            .await
    }

    /// Fetches the protocol a job was submitted with, as YAML text.
    pub async fn get_config(&self, username: &str, name: &str) -> Result<String, ApiError> {
        self.http
            .get_text(&format!("{}/jobs/{}~{}/config", API_PREFIX, username, name))
            .await
    }

    /// Lists the retry attempts of one job.
    pub async fn list_attempts(&self, username: &str, name: &str) -> Result<Vec<JobAttempt>, ApiError> {
        self.http
            .get(&format!(
                "{}/jobs/{}~{}/job-attempts",
                API_PREFIX, username, name
            ))
            .await
    }

    /// Fetches one retry attempt by index.
    pub async fn get_attempt(
        &self,
        username: &str,
        name: &str,
        index: u32,
    ) -> Result<JobAttempt, ApiError> {
        self.http
            .get(&format!(
                "{}/jobs/{}~{}/job-attempts/{}",
                API_PREFIX, username, name, index
            ))
            .await
    }

    /// Starts or stops a job.
    pub async fn update_execution_type(
        &self,
        username: &str,
        name: &str,
        execution_type: JobExecutionType,
    ) -> Result<ApiMessage, ApiError> {
        let body = ExecutionTypeBody {
            value: execution_type,
        };
        self.http
            .put_json(
                &format!("{}/jobs/{}~{}/executionType", API_PREFIX, username, name),
                &body,
            )
            .await
    }
}

/// Value of `PUT .../executionType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobExecutionType {
    Start,
    Stop,
}

#[derive(Debug, Serialize)]
struct ExecutionTypeBody {
    value: JobExecutionType,
}

/// One row of the job list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListItem {
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_gpu_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_exit_code: Option<i32>,
}

/// Status of one job as returned by `GET /api/v2/jobs/{user}~{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(default)]
    pub name: Option<String>,
    pub job_status: JobStatusInfo,
    /// Per-taskrole status, shape depends on the scheduler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_roles: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_type: Option<String>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_exit_code: Option<i32>,
}

/// One retry attempt of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAttempt {
    #[serde(default)]
    pub attempt_index: u32,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub is_latest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_started_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_completed_time: Option<u64>,
}
