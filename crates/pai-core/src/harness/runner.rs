use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::client::ApiError;

use super::case::{is_subset, ApiTestCase, ApiTestEntry, ApiTestVariant, ExpectedResponse};
use super::hooks::{find_hook, HookError, TestContext};
use super::operation::{Invoke, InvokeError};
use super::param::OperationResults;

/// Why a single variant failed.
#[derive(Debug, Error)]
pub enum VariantError {
    #[error("Expected status {expected}, but the call succeeded")]
    UnexpectedSuccess { expected: u16 },

    #[error("Expected status {expected}, got {got}: {message}")]
    Status {
        expected: u16,
        got: u16,
        message: String,
    },

    #[error("Response body does not contain the expected subset; expected {expected}, got {actual}")]
    Body { expected: Value, actual: Value },

    #[error("Response body has no `{0}` key")]
    MissingKey(String),

    #[error("Variant defines neither an operation nor a customized test")]
    EmptyVariant,

    #[error("No customized test named `{0}` is registered")]
    UnknownHook(String),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Hook(#[from] HookError),
}

/// Outcome of one variant.
#[derive(Debug)]
pub struct VariantOutcome {
    pub description: String,
    pub error: Option<VariantError>,
}

/// Outcome of one table entry.
#[derive(Debug)]
pub struct CaseReport {
    pub key: String,
    pub setup_error: Option<InvokeError>,
    pub variants: Vec<VariantOutcome>,
    pub teardown_errors: Vec<InvokeError>,
}

impl CaseReport {
    /// Setup ran to completion and every variant passed. Teardown
    /// failures are logged but do not fail the case.
    pub fn passed(&self) -> bool {
        self.setup_error.is_none() && self.variants.iter().all(|v| v.error.is_none())
    }

    /// One line per failure, for surfacing in test output.
    pub fn failures(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(err) = &self.setup_error {
            out.push(format!("{}: setup failed: {}", self.key, err));
        }
        for variant in &self.variants {
            if let Some(err) = &variant.error {
                out.push(format!("{}: {}: {}", self.key, variant.description, err));
            }
        }
        out
    }
}

/// Executes table entries against an [`Invoke`] implementation.
///
/// Per entry: setup operations run strictly in order and abort the
/// entry on the first failure; variants then run in order, each
/// reported separately; teardown operations always run, even after
/// failures, so no remote state leaks into other entries.
pub struct CaseRunner<'a, I: Invoke> {
    invoker: &'a I,
    context: TestContext,
}

impl<'a, I: Invoke> CaseRunner<'a, I> {
    pub fn new(invoker: &'a I, context: TestContext) -> Self {
        Self { invoker, context }
    }

    pub async fn run_entry(&self, entry: &ApiTestEntry) -> CaseReport {
        self.run(&entry.key, &entry.case).await
    }

    pub async fn run(&self, key: &str, case: &ApiTestCase) -> CaseReport {
        debug!(key, "running test case");
        let mut results = OperationResults::new();

        let mut setup_error = None;
        for operation in &case.before {
            match self.invoker.invoke(operation, &results).await {
                Ok(payload) => results.before.push(payload),
                Err(err) => {
                    setup_error = Some(err);
                    break;
                }
            }
        }

        let mut variants = Vec::new();
        if setup_error.is_none() {
            for (i, variant) in case.tests.iter().enumerate() {
                let description = variant
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("variant {}", i));
                let error = self.run_variant(variant, &mut results).await.err();
                variants.push(VariantOutcome { description, error });
            }
        }

        let mut teardown_errors = Vec::new();
        for operation in &case.after {
            if let Err(err) = self.invoker.invoke(operation, &results).await {
                warn!(key, error = %err, "teardown operation failed");
                teardown_errors.push(err);
            }
        }

        CaseReport {
            key: key.to_string(),
            setup_error,
            variants,
            teardown_errors,
        }
    }

    async fn run_variant(
        &self,
        variant: &ApiTestVariant,
        results: &mut OperationResults,
    ) -> Result<(), VariantError> {
        if let Some(name) = &variant.customized_test {
            let hook = find_hook(name).ok_or_else(|| VariantError::UnknownHook(name.clone()))?;
            hook(variant, results, &self.context).await?;
            return Ok(());
        }

        let operation = variant.operation.as_ref().ok_or(VariantError::EmptyVariant)?;
        match self.invoker.invoke(operation, results).await {
            Ok(payload) => {
                // Success payloads are recorded even when the variant
                // fails its body checks, so later references stay stable.
                results.test.push(payload.clone());
                let Some(expected) = &variant.response else {
                    return Ok(());
                };
                if !(200..300).contains(&expected.status_code) {
                    return Err(VariantError::UnexpectedSuccess {
                        expected: expected.status_code,
                    });
                }
                check_body(expected, &payload)
            }
            Err(err) => {
                let expected = match &variant.response {
                    Some(e) if !(200..300).contains(&e.status_code) => e,
                    _ => return Err(err.into()),
                };
                match err {
                    InvokeError::Api(ApiError::Response {
                        status,
                        code,
                        message,
                    }) => {
                        if status != expected.status_code {
                            return Err(VariantError::Status {
                                expected: expected.status_code,
                                got: status,
                                message,
                            });
                        }
                        let payload = json!({ "code": code, "message": message });
                        results.test.push(payload.clone());
                        check_body(expected, &payload)
                    }
                    other => Err(other.into()),
                }
            }
        }
    }
}

fn check_body(expected: &ExpectedResponse, actual: &Value) -> Result<(), VariantError> {
    if let Some(subset) = &expected.expect_result {
        if !is_subset(subset, actual) {
            return Err(VariantError::Body {
                expected: subset.clone(),
                actual: actual.clone(),
            });
        }
    }
    for key in &expected.expect_keys {
        if actual.get(key).is_none() {
            return Err(VariantError::MissingKey(key.clone()));
        }
    }
    Ok(())
}
