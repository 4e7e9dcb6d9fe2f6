use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::client::{
    ApiError, AuthnClient, GroupRequest, GroupUpdate, JobExecutionType, PaiClient, UserRequest,
};
use crate::config::ClusterConfig;

use super::param::{resolve, OperationResults, ParameterSpec, ResolveError};

/// The API tags, one per sub-client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiTag {
    Authn,
    Token,
    User,
    Group,
    VirtualCluster,
    Storage,
    Job,
}

impl fmt::Display for ApiTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiTag::Authn => "authn",
            ApiTag::Token => "token",
            ApiTag::User => "user",
            ApiTag::Group => "group",
            ApiTag::VirtualCluster => "virtualCluster",
            ApiTag::Storage => "storage",
            ApiTag::Job => "job",
        };
        write!(f, "{}", name)
    }
}

/// Identifies exactly one client method together with its arguments.
#[derive(Debug, Clone)]
pub struct ApiOperation {
    pub tag: ApiTag,
    pub operation_id: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ApiOperation {
    pub fn new(
        tag: ApiTag,
        operation_id: &str,
        parameters: impl IntoIterator<Item = ParameterSpec>,
    ) -> Self {
        Self {
            tag,
            operation_id: operation_id.to_string(),
            parameters: parameters.into_iter().collect(),
        }
    }
}

/// Number of parameters an operation takes, or `None` for an unknown
/// operation id. Used both before dispatch and by table validation, so
/// a malformed operation never reaches the network.
pub fn operation_arity(tag: ApiTag, operation_id: &str) -> Option<usize> {
    let arity = match (tag, operation_id) {
        (ApiTag::Authn, "getAuthnInfo") => 0,
        (ApiTag::Authn, "basicLogin") => 2,
        (ApiTag::Authn, "basicLogout") => 1,
        (ApiTag::Token, "getTokens") => 0,
        (ApiTag::Token, "createApplicationToken") => 0,
        (ApiTag::Token, "deleteToken") => 1,
        (ApiTag::User, "createUser") => 1,
        (ApiTag::User, "getAllUser") => 0,
        (ApiTag::User, "getUser") => 1,
        (ApiTag::User, "updateUserEmail") => 2,
        (ApiTag::User, "updateUserPassword") => 3,
        (ApiTag::User, "updateUserAdminPermission") => 2,
        (ApiTag::User, "updateUserVirtualCluster") => 2,
        (ApiTag::User, "deleteUser") => 1,
        (ApiTag::Group, "createGroup") => 1,
        (ApiTag::Group, "getAllGroup") => 0,
        (ApiTag::Group, "getGroup") => 1,
        (ApiTag::Group, "updateGroup") => 1,
        (ApiTag::Group, "deleteGroup") => 1,
        (ApiTag::VirtualCluster, "listVirtualClusters") => 0,
        (ApiTag::VirtualCluster, "getVirtualCluster") => 1,
        (ApiTag::Storage, "getStorages") => 0,
        (ApiTag::Storage, "getStorage") => 1,
        (ApiTag::Job, "createJob") => 1,
        (ApiTag::Job, "listJobs") => 1,
        (ApiTag::Job, "getJob") => 2,
        (ApiTag::Job, "getJobConfig") => 2,
        (ApiTag::Job, "getJobAttempts") => 2,
        (ApiTag::Job, "getJobAttempt") => 3,
        (ApiTag::Job, "updateJobExecutionType") => 3,
        _ => return None,
    };
    Some(arity)
}

/// Errors from invoking one operation.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("No operation `{operation_id}` under tag `{tag}`")]
    UnknownOperation { tag: ApiTag, operation_id: String },

    #[error("Operation `{operation_id}` takes {expected} parameters, got {got}")]
    Arity {
        operation_id: String,
        expected: usize,
        got: usize,
    },

    #[error("Operation `{operation_id}`, parameter {index}: {detail}")]
    Parameter {
        operation_id: String,
        index: usize,
        detail: String,
    },

    #[error("Failed to encode result: {0}")]
    Encode(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Seam between the case runner and the network. Production code uses
/// [`ClientInvoker`]; runner tests substitute a scripted stub.
#[async_trait]
pub trait Invoke: Send + Sync {
    /// Resolves the operation's parameters against `results`, performs
    /// the call, and returns the raw response payload.
    async fn invoke(
        &self,
        operation: &ApiOperation,
        results: &OperationResults,
    ) -> Result<Value, InvokeError>;
}

/// Dispatches operations onto the typed clients of one cluster.
pub struct ClientInvoker {
    client: PaiClient,
    cluster: ClusterConfig,
}

impl ClientInvoker {
    pub fn new(cluster: ClusterConfig) -> Self {
        Self {
            client: PaiClient::new(&cluster),
            cluster,
        }
    }

    /// Converts one resolved argument into the concrete parameter type.
    fn arg<T: DeserializeOwned>(
        operation: &ApiOperation,
        args: &[Value],
        index: usize,
    ) -> Result<T, InvokeError> {
        let value = args.get(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| InvokeError::Parameter {
            operation_id: operation.operation_id.clone(),
            index,
            detail: e.to_string(),
        })
    }
}

fn to_value<T: Serialize>(payload: T) -> Result<Value, InvokeError> {
    serde_json::to_value(payload).map_err(|e| InvokeError::Encode(e.to_string()))
}

#[async_trait]
impl Invoke for ClientInvoker {
    async fn invoke(
        &self,
        operation: &ApiOperation,
        results: &OperationResults,
    ) -> Result<Value, InvokeError> {
        match operation_arity(operation.tag, &operation.operation_id) {
            None => {
                return Err(InvokeError::UnknownOperation {
                    tag: operation.tag,
                    operation_id: operation.operation_id.clone(),
                })
            }
            Some(expected) if expected != operation.parameters.len() => {
                return Err(InvokeError::Arity {
                    operation_id: operation.operation_id.clone(),
                    expected,
                    got: operation.parameters.len(),
                })
            }
            Some(_) => {}
        }

        let args = operation
            .parameters
            .iter()
            .map(|spec| resolve(spec, results))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(tag = %operation.tag, operation = %operation.operation_id, "invoking operation");

        let client = &self.client;
        let op = operation;
        match (op.tag, op.operation_id.as_str()) {
            (ApiTag::Authn, "getAuthnInfo") => to_value(client.authn().get_info().await?),
            (ApiTag::Authn, "basicLogin") => {
                let username: String = Self::arg(op, &args, 0)?;
                let password: String = Self::arg(op, &args, 1)?;
                to_value(client.authn().basic_login(&username, &password).await?)
            }
            (ApiTag::Authn, "basicLogout") => {
                // An explicit token logs out that session instead of the
                // invoker's own.
                let token: Option<String> = Self::arg(op, &args, 0)?;
                let authn = match token {
                    Some(token) => AuthnClient::new(&self.cluster.rest_server_uri, token),
                    None => client.authn(),
                };
                to_value(authn.basic_logout().await?)
            }

            (ApiTag::Token, "getTokens") => to_value(client.token().list().await?),
            (ApiTag::Token, "createApplicationToken") => {
                to_value(client.token().create_application_token().await?)
            }
            (ApiTag::Token, "deleteToken") => {
                let token: String = Self::arg(op, &args, 0)?;
                to_value(client.token().revoke(&token).await?)
            }

            (ApiTag::User, "createUser") => {
                let user: UserRequest = Self::arg(op, &args, 0)?;
                to_value(client.user().create(&user).await?)
            }
            (ApiTag::User, "getAllUser") => to_value(client.user().list().await?),
            (ApiTag::User, "getUser") => {
                let username: String = Self::arg(op, &args, 0)?;
                to_value(client.user().get(&username).await?)
            }
            (ApiTag::User, "updateUserEmail") => {
                let username: String = Self::arg(op, &args, 0)?;
                let email: String = Self::arg(op, &args, 1)?;
                to_value(client.user().update_email(&username, &email).await?)
            }
            (ApiTag::User, "updateUserPassword") => {
                let username: String = Self::arg(op, &args, 0)?;
                let old_password: Option<String> = Self::arg(op, &args, 1)?;
                let new_password: String = Self::arg(op, &args, 2)?;
                to_value(
                    client
                        .user()
                        .update_password(&username, old_password.as_deref(), &new_password)
                        .await?,
                )
            }
            (ApiTag::User, "updateUserAdminPermission") => {
                let username: String = Self::arg(op, &args, 0)?;
                let admin: bool = Self::arg(op, &args, 1)?;
                to_value(client.user().update_admin(&username, admin).await?)
            }
            (ApiTag::User, "updateUserVirtualCluster") => {
                let username: String = Self::arg(op, &args, 0)?;
                let virtual_clusters: Vec<String> = Self::arg(op, &args, 1)?;
                to_value(
                    client
                        .user()
                        .update_virtual_clusters(&username, &virtual_clusters)
                        .await?,
                )
            }
            (ApiTag::User, "deleteUser") => {
                let username: String = Self::arg(op, &args, 0)?;
                to_value(client.user().delete(&username).await?)
            }

            (ApiTag::Group, "createGroup") => {
                let group: GroupRequest = Self::arg(op, &args, 0)?;
                to_value(client.group().create(&group).await?)
            }
            (ApiTag::Group, "getAllGroup") => to_value(client.group().list().await?),
            (ApiTag::Group, "getGroup") => {
                let groupname: String = Self::arg(op, &args, 0)?;
                to_value(client.group().get(&groupname).await?)
            }
            (ApiTag::Group, "updateGroup") => {
                let update: GroupUpdate = Self::arg(op, &args, 0)?;
                to_value(client.group().update(&update).await?)
            }
            (ApiTag::Group, "deleteGroup") => {
                let groupname: String = Self::arg(op, &args, 0)?;
                to_value(client.group().delete(&groupname).await?)
            }

            (ApiTag::VirtualCluster, "listVirtualClusters") => {
                to_value(client.virtual_cluster().list().await?)
            }
            (ApiTag::VirtualCluster, "getVirtualCluster") => {
                let name: String = Self::arg(op, &args, 0)?;
                to_value(client.virtual_cluster().get(&name).await?)
            }

            (ApiTag::Storage, "getStorages") => to_value(client.storage().list().await?),
            (ApiTag::Storage, "getStorage") => {
                let name: String = Self::arg(op, &args, 0)?;
                to_value(client.storage().get(&name).await?)
            }

            (ApiTag::Job, "createJob") => {
                let protocol: String = Self::arg(op, &args, 0)?;
                to_value(client.job().submit(&protocol).await?)
            }
            (ApiTag::Job, "listJobs") => {
                let username: Option<String> = Self::arg(op, &args, 0)?;
                to_value(client.job().list(username.as_deref()).await?)
            }
            (ApiTag::Job, "getJob") => {
                let username: String = Self::arg(op, &args, 0)?;
                let name: String = Self::arg(op, &args, 1)?;
                to_value(client.job().get(&username, &name).await?)
            }
            (ApiTag::Job, "getJobConfig") => {
                let username: String = Self::arg(op, &args, 0)?;
                let name: String = Self::arg(op, &args, 1)?;
                to_value(client.job().get_config(&username, &name).await?)
            }
            (ApiTag::Job, "getJobAttempts") => {
                let username: String = Self::arg(op, &args, 0)?;
                let name: String = Self::arg(op, &args, 1)?;
                to_value(client.job().list_attempts(&username, &name).await?)
            }
            (ApiTag::Job, "getJobAttempt") => {
                let username: String = Self::arg(op, &args, 0)?;
                let name: String = Self::arg(op, &args, 1)?;
                let attempt: u32 = Self::arg(op, &args, 2)?;
                to_value(client.job().get_attempt(&username, &name, attempt).await?)
            }
            (ApiTag::Job, "updateJobExecutionType") => {
                let username: String = Self::arg(op, &args, 0)?;
                let name: String = Self::arg(op, &args, 1)?;
                let execution_type: JobExecutionType = Self::arg(op, &args, 2)?;
                to_value(
                    client
                        .job()
                        .update_execution_type(&username, &name, execution_type)
                        .await?,
                )
            }

            _ => Err(InvokeError::UnknownOperation {
                tag: op.tag,
                operation_id: op.operation_id.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_registry_knows_every_tag() {
        assert_eq!(operation_arity(ApiTag::Authn, "basicLogin"), Some(2));
        assert_eq!(operation_arity(ApiTag::Job, "updateJobExecutionType"), Some(3));
        assert_eq!(operation_arity(ApiTag::Storage, "getStorages"), Some(0));
        assert_eq!(operation_arity(ApiTag::User, "promoteUser"), None);
    }

    #[tokio::test]
    async fn test_unknown_operation_fails_before_any_network_call() {
        // Unroutable address: reaching the network would error differently.
        let invoker = ClientInvoker::new(ClusterConfig {
            username: "alice".into(),
            password: "secret".into(),
            rest_server_uri: "http://192.0.2.1:9186".into(),
            token: "tok".into(),
        });
        let op = ApiOperation::new(ApiTag::User, "promoteUser", []);
        let err = invoker
            .invoke(&op, &OperationResults::new())
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::UnknownOperation { .. }));
    }

    #[tokio::test]
    async fn test_arity_mismatch_fails_before_any_network_call() {
        let invoker = ClientInvoker::new(ClusterConfig {
            username: "alice".into(),
            password: "secret".into(),
            rest_server_uri: "http://192.0.2.1:9186".into(),
            token: "tok".into(),
        });
        let op = ApiOperation::new(
            ApiTag::Authn,
            "basicLogin",
            [ParameterSpec::raw("alice")],
        );
        let err = invoker
            .invoke(&op, &OperationResults::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InvokeError::Arity {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_parameter_decode_failure_names_operation_and_index() {
        let invoker = ClientInvoker::new(ClusterConfig {
            username: "alice".into(),
            password: "secret".into(),
            rest_server_uri: "http://192.0.2.1:9186".into(),
            token: "tok".into(),
        });
        // A numeric username cannot decode into the String parameter.
        let op = ApiOperation::new(
            ApiTag::Authn,
            "basicLogin",
            [ParameterSpec::raw(42), ParameterSpec::raw("secret")],
        );
        let err = invoker
            .invoke(&op, &OperationResults::new())
            .await
            .unwrap_err();
        match err {
            InvokeError::Parameter {
                operation_id,
                index,
                detail,
            } => {
                assert_eq!(operation_id, "basicLogin");
                assert_eq!(index, 0);
                assert!(detail.contains("invalid type"), "detail: {detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
