//! The declarative API test table.
//!
//! Each entry pairs a `"<method> <path>"` route key with the setup
//! operations, test variants, and teardown operations that exercise the
//! route. Resource names are derived from a [`TestNames`] value so two
//! table runs never collide on the same cluster.

use std::collections::HashSet;

use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ClusterConfig;

use super::case::{ApiTestCase, ApiTestEntry, ApiTestVariant, ExpectedResponse};
use super::hooks::find_hook;
use super::operation::{operation_arity, ApiOperation, ApiTag};
use super::param::{index, key, ParameterSpec, ResultSource};

/// Password given to every user the table creates.
const TEST_PASSWORD: &str = "sdktestpassword1";

/// Unique resource names for one table run.
#[derive(Debug, Clone)]
pub struct TestNames {
    suffix: String,
}

impl TestNames {
    /// Fresh names with a random suffix.
    pub fn new() -> Self {
        let mut suffix = Uuid::new_v4().simple().to_string();
        suffix.truncate(8);
        Self { suffix }
    }

    /// Names with a caller-chosen suffix, for deterministic tables.
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn user(&self, label: &str) -> String {
        format!("sdktest{}{}", label, self.suffix)
    }

    pub fn group(&self, label: &str) -> String {
        format!("sdktestgroup{}{}", label, self.suffix)
    }

    pub fn job(&self, label: &str) -> String {
        format!("sdk_test_job_{}_{}", label, self.suffix)
    }
}

impl Default for TestNames {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal one-task protocol used by the job entries.
pub fn job_protocol(name: &str) -> String {
    format!(
        "protocolVersion: 2
name: {name}
type: job
version: !!str 1.0
contributor: pai-rs
prerequisites:
  - protocolVersion: 2
    name: test_docker_image
    type: dockerimage
    uri: ubuntu:20.04
taskRoles:
  taskrole:
    instances: 1
    dockerImage: test_docker_image
    resourcePerInstance:
      cpu: 1
      memoryMB: 512
      gpu: 0
    commands:
      - sleep 30s
"
    )
}

fn op(
    tag: ApiTag,
    operation_id: &str,
    parameters: impl IntoIterator<Item = ParameterSpec>,
) -> ApiOperation {
    ApiOperation::new(tag, operation_id, parameters)
}

fn entry(key: &str, case: ApiTestCase) -> ApiTestEntry {
    ApiTestEntry {
        key: key.to_string(),
        case,
    }
}

fn create_user_op(username: &str) -> ApiOperation {
    op(
        ApiTag::User,
        "createUser",
        [ParameterSpec::raw(json!({
            "username": username,
            "password": TEST_PASSWORD,
            "email": format!("{}@example.test", username),
            "virtualCluster": ["default"],
        }))],
    )
}

fn delete_user_op(username: &str) -> ApiOperation {
    op(ApiTag::User, "deleteUser", [ParameterSpec::raw(username)])
}

fn create_group_op(groupname: &str) -> ApiOperation {
    op(
        ApiTag::Group,
        "createGroup",
        [ParameterSpec::raw(json!({
            "groupname": groupname,
            "description": "test group",
        }))],
    )
}

fn delete_group_op(groupname: &str) -> ApiOperation {
    op(ApiTag::Group, "deleteGroup", [ParameterSpec::raw(groupname)])
}

fn submit_job_op(protocol: &str) -> ApiOperation {
    op(ApiTag::Job, "createJob", [ParameterSpec::raw(protocol)])
}

fn stop_job_op(username: &str, name: &str) -> ApiOperation {
    op(
        ApiTag::Job,
        "updateJobExecutionType",
        [
            ParameterSpec::raw(username),
            ParameterSpec::raw(name),
            ParameterSpec::raw("STOP"),
        ],
    )
}

/// Builds the full table for one cluster. Login variants use the
/// cluster's own credentials; created resources embed `names` so
/// concurrent runs stay disjoint.
pub fn test_cases(cluster: &ClusterConfig, names: &TestNames) -> Vec<ApiTestEntry> {
    let username = cluster.username.as_str();
    let mut entries = Vec::new();

    // ==================== authn ====================

    entries.push(entry(
        "get /api/v2/authn/info",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::Authn, "getAuthnInfo", []),
                ExpectedResponse::status(200).with_keys(&["authn_type"]),
            )],
            ..Default::default()
        },
    ));

    entries.push(entry(
        "post /api/v2/authn/basic/login",
        ApiTestCase {
            tests: vec![
                ApiTestVariant::operation(
                    op(
                        ApiTag::Authn,
                        "basicLogin",
                        [
                            ParameterSpec::raw(username),
                            ParameterSpec::raw(cluster.password.as_str()),
                        ],
                    ),
                    ExpectedResponse::status(200)
                        .with_result(json!({ "user": username }))
                        .with_keys(&["token"]),
                )
                .described("login with correct credentials"),
                ApiTestVariant::operation(
                    op(
                        ApiTag::Authn,
                        "basicLogin",
                        [
                            ParameterSpec::raw("nonexistentuser"),
                            ParameterSpec::raw(cluster.password.as_str()),
                        ],
                    ),
                    ExpectedResponse::status(400).with_result(json!({
                        "code": "NoUserError",
                        "message": "User nonexistentuser is not found.",
                    })),
                )
                .described("login with a nonexistent user"),
                ApiTestVariant::operation(
                    op(
                        ApiTag::Authn,
                        "basicLogin",
                        [
                            ParameterSpec::raw(username),
                            ParameterSpec::raw("incorrectpassword"),
                        ],
                    ),
                    ExpectedResponse::status(400).with_result(json!({
                        "code": "IncorrectPasswordError",
                        "message": "Password is incorrect.",
                    })),
                )
                .described("login with an incorrect password"),
            ],
            ..Default::default()
        },
    ));

    entries.push(entry(
        "delete /api/v2/authn/basic/logout",
        ApiTestCase {
            // A dedicated session, so logging out never invalidates the
            // token the rest of the table runs on.
            before: vec![op(
                ApiTag::Authn,
                "basicLogin",
                [
                    ParameterSpec::raw(username),
                    ParameterSpec::raw(cluster.password.as_str()),
                ],
            )],
            tests: vec![
                ApiTestVariant::operation(
                    op(
                        ApiTag::Authn,
                        "basicLogout",
                        [ParameterSpec::from_before(0, [key("token")])],
                    ),
                    ExpectedResponse::status(200).with_keys(&["message"]),
                )
                .described("logout with the session's own token"),
                ApiTestVariant::customized("logout with incorrect token")
                    .described("logout with an incorrect token"),
            ],
            ..Default::default()
        },
    ));

    // ==================== tokens ====================

    entries.push(entry(
        "get /api/v2/tokens",
        ApiTestCase {
            before: vec![op(ApiTag::Token, "createApplicationToken", [])],
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::Token, "getTokens", []),
                ExpectedResponse::status(200).with_keys(&["tokens"]),
            )],
            after: vec![op(
                ApiTag::Token,
                "deleteToken",
                [ParameterSpec::from_before(0, [key("token")])],
            )],
        },
    ));

    entries.push(entry(
        "post /api/v2/tokens/application",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::Token, "createApplicationToken", []),
                ExpectedResponse::status(200).with_keys(&["token"]),
            )],
            after: vec![op(
                ApiTag::Token,
                "deleteToken",
                [ParameterSpec::from_test(0, [key("token")])],
            )],
            ..Default::default()
        },
    ));

    entries.push(entry(
        "delete /api/v2/tokens/{token}",
        ApiTestCase {
            before: vec![op(ApiTag::Token, "createApplicationToken", [])],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::Token,
                    "deleteToken",
                    [ParameterSpec::from_before(0, [key("token")])],
                ),
                ExpectedResponse::status(200).with_keys(&["message"]),
            )],
            ..Default::default()
        },
    ));

    // ==================== users ====================

    let user_create = names.user("create");
    let user_conflict = names.user("conflict");
    entries.push(entry(
        "post /api/v2/users",
        ApiTestCase {
            before: vec![create_user_op(&user_conflict)],
            tests: vec![
                ApiTestVariant::operation(
                    create_user_op(&user_create),
                    ExpectedResponse::status(201).with_keys(&["message"]),
                )
                .described("create a user"),
                ApiTestVariant::operation(
                    create_user_op(&user_conflict),
                    ExpectedResponse::status(409).with_result(json!({
                        "code": "ConflictUserError",
                        "message": format!("User name {} already exists.", user_conflict),
                    })),
                )
                .described("create a user whose name is taken"),
            ],
            after: vec![delete_user_op(&user_create), delete_user_op(&user_conflict)],
        },
    ));

    entries.push(entry(
        "get /api/v2/users",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::User, "getAllUser", []),
                ExpectedResponse::status(200),
            )],
            ..Default::default()
        },
    ));

    let user_get = names.user("get");
    entries.push(entry(
        "get /api/v2/users/{user}",
        ApiTestCase {
            before: vec![create_user_op(&user_get)],
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::User, "getUser", [ParameterSpec::raw(user_get.as_str())]),
                ExpectedResponse::status(200).with_result(json!({
                    "username": user_get,
                    "admin": false,
                })),
            )],
            after: vec![delete_user_op(&user_get)],
        },
    ));

    let user_email = names.user("email");
    entries.push(entry(
        "put /api/v2/users/{user}/email",
        ApiTestCase {
            before: vec![create_user_op(&user_email)],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::User,
                    "updateUserEmail",
                    [
                        ParameterSpec::raw(user_email.as_str()),
                        ParameterSpec::raw("updated@example.test"),
                    ],
                ),
                ExpectedResponse::status(201).with_keys(&["message"]),
            )],
            after: vec![delete_user_op(&user_email)],
        },
    ));

    let user_password = names.user("password");
    entries.push(entry(
        "put /api/v2/users/{user}/password",
        ApiTestCase {
            before: vec![create_user_op(&user_password)],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::User,
                    "updateUserPassword",
                    [
                        ParameterSpec::raw(user_password.as_str()),
                        // Admin callers may omit the old password.
                        ParameterSpec::raw(serde_json::Value::Null),
                        ParameterSpec::raw("sdktestpassword2"),
                    ],
                ),
                ExpectedResponse::status(201).with_keys(&["message"]),
            )],
            after: vec![delete_user_op(&user_password)],
        },
    ));

    let user_admin = names.user("admin");
    entries.push(entry(
        "put /api/v2/users/{user}/admin",
        ApiTestCase {
            before: vec![create_user_op(&user_admin)],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::User,
                    "updateUserAdminPermission",
                    [
                        ParameterSpec::raw(user_admin.as_str()),
                        ParameterSpec::raw(true),
                    ],
                ),
                ExpectedResponse::status(201).with_keys(&["message"]),
            )],
            after: vec![delete_user_op(&user_admin)],
        },
    ));

    let user_vc = names.user("vc");
    entries.push(entry(
        "put /api/v2/users/{user}/virtualcluster",
        ApiTestCase {
            before: vec![create_user_op(&user_vc)],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::User,
                    "updateUserVirtualCluster",
                    [
                        ParameterSpec::raw(user_vc.as_str()),
                        ParameterSpec::raw(json!(["default"])),
                    ],
                ),
                ExpectedResponse::status(201).with_keys(&["message"]),
            )],
            after: vec![delete_user_op(&user_vc)],
        },
    ));

    let user_delete = names.user("delete");
    entries.push(entry(
        "delete /api/v2/users/{user}",
        ApiTestCase {
            before: vec![create_user_op(&user_delete)],
            tests: vec![ApiTestVariant::operation(
                delete_user_op(&user_delete),
                ExpectedResponse::status(200).with_keys(&["message"]),
            )],
            ..Default::default()
        },
    ));

    // ==================== groups ====================

    let group_create = names.group("create");
    entries.push(entry(
        "post /api/v2/groups",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                create_group_op(&group_create),
                ExpectedResponse::status(201).with_keys(&["message"]),
            )],
            after: vec![delete_group_op(&group_create)],
            ..Default::default()
        },
    ));

    entries.push(entry(
        "get /api/v2/groups",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::Group, "getAllGroup", []),
                ExpectedResponse::status(200),
            )],
            ..Default::default()
        },
    ));

    let group_get = names.group("get");
    entries.push(entry(
        "get /api/v2/groups/{group}",
        ApiTestCase {
            before: vec![create_group_op(&group_get)],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::Group,
                    "getGroup",
                    [ParameterSpec::raw(group_get.as_str())],
                ),
                ExpectedResponse::status(200).with_result(json!({ "groupname": group_get })),
            )],
            after: vec![delete_group_op(&group_get)],
        },
    ));

    let group_update = names.group("update");
    entries.push(entry(
        "put /api/v2/groups",
        ApiTestCase {
            before: vec![create_group_op(&group_update)],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::Group,
                    "updateGroup",
                    [ParameterSpec::raw(json!({
                        "data": {
                            "groupname": group_update,
                            "description": "updated description",
                        },
                        "patch": true,
                    }))],
                ),
                ExpectedResponse::status(201).with_keys(&["message"]),
            )],
            after: vec![delete_group_op(&group_update)],
        },
    ));

    let group_delete = names.group("delete");
    entries.push(entry(
        "delete /api/v2/groups/{group}",
        ApiTestCase {
            before: vec![create_group_op(&group_delete)],
            tests: vec![ApiTestVariant::operation(
                delete_group_op(&group_delete),
                ExpectedResponse::status(200).with_keys(&["message"]),
            )],
            ..Default::default()
        },
    ));

    // ==================== virtual clusters ====================

    entries.push(entry(
        "get /api/v2/virtual-clusters",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::VirtualCluster, "listVirtualClusters", []),
                ExpectedResponse::status(200).with_keys(&["default"]),
            )],
            ..Default::default()
        },
    ));

    entries.push(entry(
        "get /api/v2/virtual-clusters/{vc}",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::VirtualCluster,
                    "getVirtualCluster",
                    [ParameterSpec::raw("default")],
                ),
                ExpectedResponse::status(200),
            )],
            ..Default::default()
        },
    ));

    // ==================== storages ====================

    entries.push(entry(
        "get /api/v2/storages",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::Storage, "getStorages", []),
                ExpectedResponse::status(200).with_keys(&["storages"]),
            )],
            ..Default::default()
        },
    ));

    entries.push(entry(
        "get /api/v2/storages/{storage}",
        ApiTestCase {
            // Storage names are cluster-specific, so fetch whichever one
            // is listed first.
            before: vec![op(ApiTag::Storage, "getStorages", [])],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::Storage,
                    "getStorage",
                    [ParameterSpec::from_before(
                        0,
                        [key("storages"), index(0), key("name")],
                    )],
                ),
                ExpectedResponse::status(200).with_keys(&["name"]),
            )],
            ..Default::default()
        },
    ));

    // ==================== jobs ====================

    let job_submit = names.job("submit");
    entries.push(entry(
        "post /api/v2/jobs",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                submit_job_op(&job_protocol(&job_submit)),
                ExpectedResponse::status(202),
            )],
            after: vec![stop_job_op(username, &job_submit)],
            ..Default::default()
        },
    ));

    entries.push(entry(
        "get /api/v2/jobs",
        ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::Job, "listJobs", [ParameterSpec::raw(username)]),
                ExpectedResponse::status(200),
            )],
            ..Default::default()
        },
    ));

    let job_detail = names.job("detail");
    entries.push(entry(
        "get /api/v2/jobs/{user}~{job}",
        ApiTestCase {
            before: vec![submit_job_op(&job_protocol(&job_detail))],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::Job,
                    "getJob",
                    [
                        ParameterSpec::raw(username),
                        ParameterSpec::raw(job_detail.as_str()),
                    ],
                ),
                ExpectedResponse::status(200).with_keys(&["jobStatus"]),
            )],
            after: vec![stop_job_op(username, &job_detail)],
        },
    ));

    let job_config = names.job("config");
    let job_config_protocol = job_protocol(&job_config);
    entries.push(entry(
        "get /api/v2/jobs/{user}~{job}/config",
        ApiTestCase {
            before: vec![submit_job_op(&job_config_protocol)],
            tests: vec![ApiTestVariant::customized_with_operation(
                "submitted job config round-trips",
                op(
                    ApiTag::Job,
                    "getJobConfig",
                    [
                        ParameterSpec::raw(username),
                        ParameterSpec::raw(job_config.as_str()),
                        ParameterSpec::raw(job_config_protocol.as_str()),
                    ],
                ),
            )
            .described("fetched config matches the submitted protocol")],
            after: vec![stop_job_op(username, &job_config)],
        },
    ));

    let job_attempts = names.job("attempts");
    entries.push(entry(
        "get /api/v2/jobs/{user}~{job}/job-attempts",
        ApiTestCase {
            before: vec![submit_job_op(&job_protocol(&job_attempts))],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::Job,
                    "getJobAttempts",
                    [
                        ParameterSpec::raw(username),
                        ParameterSpec::raw(job_attempts.as_str()),
                    ],
                ),
                ExpectedResponse::status(200),
            )],
            after: vec![stop_job_op(username, &job_attempts)],
        },
    ));

    let job_attempt = names.job("attempt");
    entries.push(entry(
        "get /api/v2/jobs/{user}~{job}/job-attempts/{index}",
        ApiTestCase {
            before: vec![submit_job_op(&job_protocol(&job_attempt))],
            tests: vec![ApiTestVariant::operation(
                op(
                    ApiTag::Job,
                    "getJobAttempt",
                    [
                        ParameterSpec::raw(username),
                        ParameterSpec::raw(job_attempt.as_str()),
                        ParameterSpec::raw(0),
                    ],
                ),
                ExpectedResponse::status(200),
            )],
            after: vec![stop_job_op(username, &job_attempt)],
        },
    ));

    let job_stop = names.job("stop");
    entries.push(entry(
        "put /api/v2/jobs/{user}~{job}/executionType",
        ApiTestCase {
            before: vec![submit_job_op(&job_protocol(&job_stop))],
            tests: vec![ApiTestVariant::operation(
                stop_job_op(username, &job_stop),
                ExpectedResponse::status(200).with_keys(&["message"]),
            )],
            ..Default::default()
        },
    ));

    entries
}

/// Authoring defects in a table. These abort a run before any network
/// call is made.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("`{key}`: route key must be `<method> <path>` with a lowercase method and an /api path")]
    BadKey { key: String },

    #[error("`{key}`: duplicate route key")]
    DuplicateKey { key: String },

    #[error("`{key}`: {place}: unknown operation `{operation_id}` under tag `{tag}`")]
    UnknownOperation {
        key: String,
        place: String,
        tag: ApiTag,
        operation_id: String,
    },

    #[error("`{key}`: {place}: operation `{operation_id}` takes {expected} parameters, got {got}")]
    Arity {
        key: String,
        place: String,
        operation_id: String,
        expected: usize,
        got: usize,
    },

    #[error("`{key}`: {place}: references {origin}[{index}] before it exists")]
    ForwardReference {
        key: String,
        place: String,
        origin: ResultSource,
        index: usize,
    },

    #[error("`{key}`: variant {index} defines neither an operation nor a customized test")]
    EmptyVariant { key: String, index: usize },

    #[error("`{key}`: no customized test named `{name}` is registered")]
    UnknownHook { key: String, name: String },
}

const METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];

/// Checks a set of entries for authoring defects: malformed route keys,
/// duplicate keys, unknown operations, arity mismatches, references to
/// results that cannot exist yet, unknown hooks, and empty variants.
/// An operation carried by a hook variant is input data for the hook,
/// never dispatched, so only its references are checked.
pub fn validate_entries(entries: &[ApiTestEntry]) -> Result<(), TableError> {
    let mut seen = HashSet::new();
    for entry in entries {
        let key = entry.key.as_str();
        let mut parts = key.splitn(2, ' ');
        let method = parts.next().unwrap_or_default();
        let path = parts.next().unwrap_or_default();
        if !METHODS.contains(&method) || !path.starts_with("/api/") {
            return Err(TableError::BadKey {
                key: key.to_string(),
            });
        }
        if !seen.insert(key) {
            return Err(TableError::DuplicateKey {
                key: key.to_string(),
            });
        }

        let before_len = entry.case.before.len();
        for (j, operation) in entry.case.before.iter().enumerate() {
            // Setup step j may only read payloads of steps before it.
            check_operation(key, &format!("before[{}]", j), operation, j, 0)?;
        }

        let mut recorded = 0;
        for (i, variant) in entry.case.tests.iter().enumerate() {
            let place = format!("tests[{}]", i);
            match (&variant.customized_test, &variant.operation) {
                (None, None) => {
                    return Err(TableError::EmptyVariant {
                        key: key.to_string(),
                        index: i,
                    })
                }
                (Some(name), _) => {
                    if find_hook(name).is_none() {
                        return Err(TableError::UnknownHook {
                            key: key.to_string(),
                            name: name.clone(),
                        });
                    }
                }
                (None, Some(_)) => {}
            }
            if let Some(operation) = &variant.operation {
                if variant.customized_test.is_some() {
                    check_parameters(key, &place, &operation.parameters, before_len, recorded)?;
                } else {
                    check_operation(key, &place, operation, before_len, recorded)?;
                }
            }
            // Only plain operation variants record a payload; hooks do
            // their own calls and keep the results lists untouched.
            if variant.customized_test.is_none() && variant.operation.is_some() {
                recorded += 1;
            }
        }

        for (j, operation) in entry.case.after.iter().enumerate() {
            check_operation(key, &format!("after[{}]", j), operation, before_len, recorded)?;
        }
    }
    Ok(())
}

fn check_operation(
    key: &str,
    place: &str,
    operation: &ApiOperation,
    before_len: usize,
    test_len: usize,
) -> Result<(), TableError> {
    let expected = match operation_arity(operation.tag, &operation.operation_id) {
        Some(expected) => expected,
        None => {
            return Err(TableError::UnknownOperation {
                key: key.to_string(),
                place: place.to_string(),
                tag: operation.tag,
                operation_id: operation.operation_id.clone(),
            })
        }
    };
    if expected != operation.parameters.len() {
        return Err(TableError::Arity {
            key: key.to_string(),
            place: place.to_string(),
            operation_id: operation.operation_id.clone(),
            expected,
            got: operation.parameters.len(),
        });
    }
    check_parameters(key, place, &operation.parameters, before_len, test_len)
}

fn check_parameters(
    key: &str,
    place: &str,
    parameters: &[ParameterSpec],
    before_len: usize,
    test_len: usize,
) -> Result<(), TableError> {
    for spec in parameters {
        if let ParameterSpec::FromResult {
            source,
            result_index,
            ..
        } = spec
        {
            let available = match source {
                ResultSource::Before => before_len,
                ResultSource::Test => test_len,
            };
            if *result_index >= available {
                return Err(TableError::ForwardReference {
                    key: key.to_string(),
                    place: place.to_string(),
                    origin: *source,
                    index: *result_index,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> ClusterConfig {
        ClusterConfig {
            username: "admin".to_string(),
            password: "admin-password".to_string(),
            rest_server_uri: "http://pai.example.test:9186".to_string(),
            token: "token".to_string(),
        }
    }

    #[test]
    fn test_builtin_table_validates() {
        let entries = test_cases(&cluster(), &TestNames::with_suffix("t"));
        validate_entries(&entries).unwrap();
    }

    #[test]
    fn test_builtin_table_covers_every_tag() {
        let entries = test_cases(&cluster(), &TestNames::with_suffix("t"));
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        for prefix in [
            "get /api/v2/authn",
            "get /api/v2/tokens",
            "post /api/v2/users",
            "post /api/v2/groups",
            "get /api/v2/virtual-clusters",
            "get /api/v2/storages",
            "post /api/v2/jobs",
        ] {
            assert!(
                keys.iter().any(|k| k.starts_with(prefix)),
                "no entry for {prefix}"
            );
        }
    }

    #[test]
    fn test_names_embed_the_suffix() {
        let names = TestNames::with_suffix("ab12cd34");
        assert_eq!(names.user("create"), "sdktestcreateab12cd34");
        assert_eq!(names.job("submit"), "sdk_test_job_submit_ab12cd34");
    }

    #[test]
    fn test_random_names_differ_between_runs() {
        assert_ne!(TestNames::new().user("x"), TestNames::new().user("x"));
    }

    #[test]
    fn test_rejects_malformed_route_key() {
        let entries = vec![entry("FETCH /api/v2/users", ApiTestCase::default())];
        assert!(matches!(
            validate_entries(&entries),
            Err(TableError::BadKey { .. })
        ));
    }

    #[test]
    fn test_rejects_forward_reference_in_setup() {
        let case = ApiTestCase {
            before: vec![op(
                ApiTag::Token,
                "deleteToken",
                [ParameterSpec::from_before(0, [key("token")])],
            )],
            ..Default::default()
        };
        let entries = vec![entry("delete /api/v2/tokens/{token}", case)];
        assert!(matches!(
            validate_entries(&entries),
            Err(TableError::ForwardReference { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_operation() {
        let case = ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::User, "promoteUser", []),
                ExpectedResponse::status(200),
            )],
            ..Default::default()
        };
        let entries = vec![entry("get /api/v2/users", case)];
        assert!(matches!(
            validate_entries(&entries),
            Err(TableError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn test_rejects_arity_mismatch() {
        let case = ApiTestCase {
            tests: vec![ApiTestVariant::operation(
                op(ApiTag::Authn, "basicLogin", [ParameterSpec::raw("admin")]),
                ExpectedResponse::status(200),
            )],
            ..Default::default()
        };
        let entries = vec![entry("post /api/v2/authn/basic/login", case)];
        assert!(matches!(
            validate_entries(&entries),
            Err(TableError::Arity {
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_hook_inputs_are_not_arity_checked() {
        // The config hook consumes three inputs while the carried
        // operation id is registered with two parameters.
        let case = ApiTestCase {
            tests: vec![ApiTestVariant::customized_with_operation(
                "submitted job config round-trips",
                op(
                    ApiTag::Job,
                    "getJobConfig",
                    [
                        ParameterSpec::raw("admin"),
                        ParameterSpec::raw("job1"),
                        ParameterSpec::raw("protocolVersion: 2"),
                    ],
                ),
            )],
            ..Default::default()
        };
        let entries = vec![entry("get /api/v2/jobs/{user}~{job}/config", case)];
        validate_entries(&entries).unwrap();
    }

    #[test]
    fn test_hook_inputs_still_reject_forward_references() {
        let case = ApiTestCase {
            tests: vec![ApiTestVariant::customized_with_operation(
                "submitted job config round-trips",
                op(
                    ApiTag::Job,
                    "getJobConfig",
                    [ParameterSpec::from_before(0, [key("name")])],
                ),
            )],
            ..Default::default()
        };
        let entries = vec![entry("get /api/v2/jobs/{user}~{job}/config", case)];
        assert!(matches!(
            validate_entries(&entries),
            Err(TableError::ForwardReference { .. })
        ));
    }

    #[test]
    fn test_job_protocol_embeds_the_name() {
        let yaml = job_protocol("sdk_test_job_x_1");
        assert!(yaml.contains("name: sdk_test_job_x_1"));
        assert!(yaml.contains("protocolVersion: 2"));
    }
}
