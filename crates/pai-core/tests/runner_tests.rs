use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use pai_core::client::ApiError;
use pai_core::harness::{
    key, resolve, ApiOperation, ApiTag, ApiTestCase, ApiTestVariant, CaseRunner, ExpectedResponse,
    Invoke, InvokeError, OperationResults, ParameterSpec, TestContext, VariantError,
};
use pai_core::ClusterConfig;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

type Scripted = Result<Value, (u16, &'static str, &'static str)>;

/// Invoker that replays a scripted sequence of outcomes and records the
/// operation id and resolved arguments of every call it receives.
struct StubInvoker {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl StubInvoker {
    fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Invoke for StubInvoker {
    async fn invoke(
        &self,
        operation: &ApiOperation,
        results: &OperationResults,
    ) -> Result<Value, InvokeError> {
        let args = operation
            .parameters
            .iter()
            .map(|spec| resolve(spec, results))
            .collect::<Result<Vec<_>, _>>()?;
        self.calls
            .lock()
            .unwrap()
            .push((operation.operation_id.clone(), args));
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err((status, code, message))) => Err(InvokeError::Api(ApiError::Response {
                status,
                code: code.to_string(),
                message: message.to_string(),
            })),
            None => Ok(json!({})),
        }
    }
}

fn context() -> TestContext {
    TestContext::new(ClusterConfig {
        username: "admin".to_string(),
        password: "admin-password".to_string(),
        rest_server_uri: "http://pai.example.test:9186".to_string(),
        token: "token".to_string(),
    })
}

fn op(tag: ApiTag, id: &str, params: Vec<ParameterSpec>) -> ApiOperation {
    ApiOperation::new(tag, id, params)
}

#[tokio::test]
async fn test_setup_results_thread_into_variants() {
    let invoker = StubInvoker::new(vec![
        Ok(json!({"token": "app-token", "application": true})),
        Ok(json!({"message": "deleted"})),
    ]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        before: vec![op(ApiTag::Token, "createApplicationToken", vec![])],
        tests: vec![ApiTestVariant::operation(
            op(
                ApiTag::Token,
                "deleteToken",
                vec![ParameterSpec::from_before(0, [key("token")])],
            ),
            ExpectedResponse::status(200).with_keys(&["message"]),
        )],
        ..Default::default()
    };

    let report = runner.run("delete /api/v2/tokens/{token}", &case).await;
    assert!(report.passed(), "failures: {:?}", report.failures());

    let calls = invoker.calls();
    assert_eq!(calls[1].0, "deleteToken");
    assert_eq!(calls[1].1, vec![json!("app-token")]);
}

#[tokio::test]
async fn test_setup_failure_skips_variants_but_still_tears_down() {
    let invoker = StubInvoker::new(vec![
        Err((500, "UnknownError", "boom")),
        Ok(json!({"message": "deleted"})),
    ]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        before: vec![op(ApiTag::Token, "createApplicationToken", vec![])],
        tests: vec![ApiTestVariant::operation(
            op(ApiTag::Token, "getTokens", vec![]),
            ExpectedResponse::status(200),
        )],
        after: vec![op(
            ApiTag::User,
            "deleteUser",
            vec![ParameterSpec::raw("leftover")],
        )],
    };

    let report = runner.run("get /api/v2/tokens", &case).await;
    assert!(!report.passed());
    assert!(report.setup_error.is_some());
    assert!(report.variants.is_empty());

    let calls = invoker.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "createApplicationToken");
    assert_eq!(calls[1].0, "deleteUser");
}

#[tokio::test]
async fn test_error_expectation_matches_status_and_body() {
    let invoker = StubInvoker::new(vec![Err((
        400,
        "NoUserError",
        "User nonexistentuser is not found.",
    ))]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::operation(
            op(
                ApiTag::Authn,
                "basicLogin",
                vec![
                    ParameterSpec::raw("nonexistentuser"),
                    ParameterSpec::raw("whatever"),
                ],
            ),
            ExpectedResponse::status(400).with_result(json!({
                "code": "NoUserError",
                "message": "User nonexistentuser is not found.",
            })),
        )],
        ..Default::default()
    };

    let report = runner.run("post /api/v2/authn/basic/login", &case).await;
    assert!(report.passed(), "failures: {:?}", report.failures());
}

#[tokio::test]
async fn test_success_when_error_was_expected_fails() {
    let invoker = StubInvoker::new(vec![Ok(json!({"message": "created"}))]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::operation(
            op(ApiTag::User, "getAllUser", vec![]),
            ExpectedResponse::status(409),
        )],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    assert!(matches!(
        report.variants[0].error,
        Some(VariantError::UnexpectedSuccess { expected: 409 })
    ));
}

#[tokio::test]
async fn test_wrong_error_status_fails() {
    let invoker = StubInvoker::new(vec![Err((409, "ConflictUserError", "taken"))]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::operation(
            op(ApiTag::User, "getAllUser", vec![]),
            ExpectedResponse::status(400),
        )],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    assert!(matches!(
        report.variants[0].error,
        Some(VariantError::Status {
            expected: 400,
            got: 409,
            ..
        })
    ));
}

#[tokio::test]
async fn test_body_subset_mismatch_fails() {
    let invoker = StubInvoker::new(vec![Ok(json!({"user": "bob"}))]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::operation(
            op(ApiTag::User, "getAllUser", vec![]),
            ExpectedResponse::status(200).with_result(json!({"user": "alice"})),
        )],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    assert!(matches!(
        report.variants[0].error,
        Some(VariantError::Body { .. })
    ));
}

#[tokio::test]
async fn test_missing_expected_key_fails() {
    let invoker = StubInvoker::new(vec![Ok(json!({"user": "admin"}))]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::operation(
            op(ApiTag::Authn, "getAuthnInfo", vec![]),
            ExpectedResponse::status(200).with_keys(&["token"]),
        )],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/authn/info", &case).await;
    assert!(
        matches!(&report.variants[0].error, Some(VariantError::MissingKey(k)) if k == "token")
    );
}

#[tokio::test]
async fn test_matched_error_bodies_are_recorded_for_later_references() {
    let invoker = StubInvoker::new(vec![
        Err((409, "ConflictUserError", "User name x already exists.")),
        Ok(json!({"username": "whoever"})),
    ]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![
            ApiTestVariant::operation(
                op(ApiTag::User, "getAllUser", vec![]),
                ExpectedResponse::status(409),
            ),
            ApiTestVariant::operation(
                op(
                    ApiTag::User,
                    "getUser",
                    vec![ParameterSpec::from_test(0, [key("code")])],
                ),
                ExpectedResponse::status(200),
            ),
        ],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    assert!(report.passed(), "failures: {:?}", report.failures());
    assert_eq!(invoker.calls()[1].1, vec![json!("ConflictUserError")]);
}

#[tokio::test]
async fn test_teardown_failures_do_not_fail_the_case() {
    let invoker = StubInvoker::new(vec![
        Ok(json!({"message": "ok"})),
        Err((404, "NoUserError", "already gone")),
    ]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::operation(
            op(ApiTag::User, "getAllUser", vec![]),
            ExpectedResponse::status(200),
        )],
        after: vec![op(
            ApiTag::User,
            "deleteUser",
            vec![ParameterSpec::raw("ghost")],
        )],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    assert!(report.passed());
    assert_eq!(report.teardown_errors.len(), 1);
}

#[tokio::test]
async fn test_teardown_runs_after_a_failed_variant() {
    let invoker = StubInvoker::new(vec![
        Err((500, "UnknownError", "boom")),
        Ok(json!({"message": "deleted"})),
    ]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::operation(
            op(ApiTag::User, "getAllUser", vec![]),
            ExpectedResponse::status(200),
        )],
        after: vec![op(
            ApiTag::User,
            "deleteUser",
            vec![ParameterSpec::raw("leftover")],
        )],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    assert!(!report.passed());
    assert!(report.variants[0].error.is_some());
    assert!(report.teardown_errors.is_empty());

    let calls = invoker.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, "deleteUser");
}

#[tokio::test]
async fn test_unknown_hook_fails_the_variant() {
    let invoker = StubInvoker::new(vec![]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::customized("no such hook")],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    assert!(matches!(
        report.variants[0].error,
        Some(VariantError::UnknownHook(_))
    ));
}

#[tokio::test]
async fn test_variant_without_expectation_passes_on_success() {
    let invoker = StubInvoker::new(vec![Ok(json!({"anything": 1}))]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant {
            operation: Some(op(ApiTag::User, "getAllUser", vec![])),
            ..Default::default()
        }],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    assert!(report.passed());
}

#[tokio::test]
async fn test_failure_lines_name_the_route_and_variant() {
    let invoker = StubInvoker::new(vec![Ok(json!({"user": "bob"}))]);
    let runner = CaseRunner::new(&invoker, context());

    let case = ApiTestCase {
        tests: vec![ApiTestVariant::operation(
            op(ApiTag::User, "getAllUser", vec![]),
            ExpectedResponse::status(200).with_result(json!({"user": "alice"})),
        )
        .described("list contains alice")],
        ..Default::default()
    };

    let report = runner.run("get /api/v2/users", &case).await;
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("get /api/v2/users"));
    assert!(failures[0].contains("list contains alice"));
}
