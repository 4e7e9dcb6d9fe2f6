use serde_json::Value;

use super::operation::ApiOperation;

/// What a test variant expects back from the service.
#[derive(Debug, Clone)]
pub struct ExpectedResponse {
    /// Status class the call must land in. A 2xx expectation is satisfied
    /// by any successful call; a non-2xx expectation must match the
    /// returned status exactly.
    pub status_code: u16,
    /// Deep subset the response body must contain.
    pub expect_result: Option<Value>,
    /// Top-level keys the response body must carry, independent of their
    /// values.
    pub expect_keys: Vec<String>,
}

impl ExpectedResponse {
    pub fn status(status_code: u16) -> Self {
        Self {
            status_code,
            expect_result: None,
            expect_keys: Vec::new(),
        }
    }

    pub fn with_result(mut self, expected: Value) -> Self {
        self.expect_result = Some(expected);
        self
    }

    pub fn with_keys(mut self, keys: &[&str]) -> Self {
        self.expect_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }
}

/// One variant of a table entry. Execution is driven by the hook when
/// `customized_test` is set, otherwise by `operation`; a hook variant
/// may still carry an operation as its input data.
#[derive(Debug, Clone, Default)]
pub struct ApiTestVariant {
    pub description: Option<String>,
    pub operation: Option<ApiOperation>,
    pub response: Option<ExpectedResponse>,
    pub customized_test: Option<String>,
}

impl ApiTestVariant {
    /// Plain variant: invoke `operation`, check `response`.
    pub fn operation(operation: ApiOperation, response: ExpectedResponse) -> Self {
        Self {
            description: None,
            operation: Some(operation),
            response: Some(response),
            customized_test: None,
        }
    }

    /// Hook-driven variant.
    pub fn customized(name: &str) -> Self {
        Self {
            description: None,
            operation: None,
            response: None,
            customized_test: Some(name.to_string()),
        }
    }

    /// Hook-driven variant that carries an operation as input data.
    pub fn customized_with_operation(name: &str, operation: ApiOperation) -> Self {
        Self {
            description: None,
            operation: Some(operation),
            response: None,
            customized_test: Some(name.to_string()),
        }
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A full table entry: sequential setup, independent variants,
/// best-effort teardown.
#[derive(Debug, Clone, Default)]
pub struct ApiTestCase {
    pub before: Vec<ApiOperation>,
    pub tests: Vec<ApiTestVariant>,
    pub after: Vec<ApiOperation>,
}

/// A table entry together with its `"<method> <path>"` route key.
#[derive(Debug, Clone)]
pub struct ApiTestEntry {
    pub key: String,
    pub case: ApiTestCase,
}

/// Deep subset check: every leaf of `expected` must appear in `actual`
/// at the same place. Arrays compare index by index, objects key by
/// key; extra content in `actual` is ignored.
pub fn is_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => expected
            .iter()
            .all(|(key, value)| actual.get(key).is_some_and(|a| is_subset(value, a))),
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() <= actual.len()
                && expected
                    .iter()
                    .zip(actual.iter())
                    .all(|(e, a)| is_subset(e, a))
        }
        (expected, actual) => expected == actual,
    }
}
