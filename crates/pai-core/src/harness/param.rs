use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Which accumulator list a [`ParameterSpec::FromResult`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    /// Payloads recorded by the setup operations of the current case.
    Before,
    /// Payloads recorded by earlier test variants of the current case.
    Test,
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSource::Before => write!(f, "beforeResults"),
            ResultSource::Test => write!(f, "testResults"),
        }
    }
}

/// One step into a recorded payload: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => write!(f, "{}", key),
            PathStep::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Shorthand for [`PathStep::Key`], keeps table definitions readable.
pub fn key(key: &str) -> PathStep {
    PathStep::Key(key.to_string())
}

/// Shorthand for [`PathStep::Index`].
pub fn index(index: usize) -> PathStep {
    PathStep::Index(index)
}

/// How one argument of an operation obtains its concrete value: either
/// a literal, or a value extracted from an earlier response payload.
#[derive(Debug, Clone)]
pub enum ParameterSpec {
    Raw(Value),
    FromResult {
        source: ResultSource,
        /// Which payload of the source list to start from.
        result_index: usize,
        /// Steps from that payload down to the wanted value. Empty means
        /// the whole payload.
        result_path: Vec<PathStep>,
    },
}

impl ParameterSpec {
    pub fn raw(value: impl Into<Value>) -> Self {
        ParameterSpec::Raw(value.into())
    }

    pub fn from_before(result_index: usize, result_path: impl IntoIterator<Item = PathStep>) -> Self {
        ParameterSpec::FromResult {
            source: ResultSource::Before,
            result_index,
            result_path: result_path.into_iter().collect(),
        }
    }

    pub fn from_test(result_index: usize, result_path: impl IntoIterator<Item = PathStep>) -> Self {
        ParameterSpec::FromResult {
            source: ResultSource::Test,
            result_index,
            result_path: result_path.into_iter().collect(),
        }
    }
}

/// Response payloads accumulated over one test-case execution, in
/// invocation order.
#[derive(Debug, Default)]
pub struct OperationResults {
    pub before: Vec<Value>,
    pub test: Vec<Value>,
}

impl OperationResults {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, source: ResultSource) -> &[Value] {
        match source {
            ResultSource::Before => &self.before,
            ResultSource::Test => &self.test,
        }
    }
}

/// Errors raised while resolving a parameter. Both variants point at a
/// defective table entry, not at the service under test.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Result index {index} out of bounds for {origin} (len {len})")]
    ResultIndex {
        origin: ResultSource,
        index: usize,
        len: usize,
    },

    #[error("Path step `{step}` not found under `{at}`")]
    Path { step: String, at: String },
}

/// Produces the concrete argument value for `spec`. `Raw` values are
/// deep-copied so a table can never alias live results.
pub fn resolve(spec: &ParameterSpec, results: &OperationResults) -> Result<Value, ResolveError> {
    match spec {
        ParameterSpec::Raw(value) => Ok(value.clone()),
        ParameterSpec::FromResult {
            source,
            result_index,
            result_path,
        } => {
            let list = results.list(*source);
            let mut current = list.get(*result_index).ok_or(ResolveError::ResultIndex {
                origin: *source,
                index: *result_index,
                len: list.len(),
            })?;
            for (depth, step) in result_path.iter().enumerate() {
                let next = match step {
                    PathStep::Key(key) => current.get(key.as_str()),
                    PathStep::Index(index) => current.get(*index),
                };
                current = next.ok_or_else(|| ResolveError::Path {
                    step: step.to_string(),
                    at: describe_path(*source, *result_index, &result_path[..depth]),
                })?;
            }
            Ok(current.clone())
        }
    }
}

fn describe_path(source: ResultSource, index: usize, steps: &[PathStep]) -> String {
    let mut out = format!("{}[{}]", source, index);
    for step in steps {
        match step {
            PathStep::Key(k) => {
                out.push('.');
                out.push_str(k);
            }
            PathStep::Index(i) => out.push_str(&format!("[{}]", i)),
        }
    }
    out
}
