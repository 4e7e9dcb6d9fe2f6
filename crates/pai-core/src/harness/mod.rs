//! Declarative API test harness.
//!
//! Routes are exercised by a table of test cases rather than by
//! hand-written call sequences: each entry names a route, the setup and
//! teardown operations around it, and the variants to check. The
//! [`CaseRunner`] resolves parameters against earlier payloads, drives
//! an [`Invoke`] implementation, and reports per-variant outcomes.

mod case;
mod hooks;
mod operation;
mod param;
mod runner;
mod table;

pub use case::{is_subset, ApiTestCase, ApiTestEntry, ApiTestVariant, ExpectedResponse};
pub use hooks::{find_hook, HookError, HookFn, TestContext};
pub use operation::{
    operation_arity, ApiOperation, ApiTag, ClientInvoker, Invoke, InvokeError,
};
pub use param::{
    index, key, resolve, OperationResults, ParameterSpec, PathStep, ResolveError, ResultSource,
};
pub use runner::{CaseReport, CaseRunner, VariantError, VariantOutcome};
pub use table::{job_protocol, test_cases, validate_entries, TableError, TestNames};
