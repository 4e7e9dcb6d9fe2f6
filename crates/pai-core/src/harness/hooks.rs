//! Customized test hooks.
//!
//! A hook covers assertions the declarative status/body model cannot
//! express, like calling with deliberately wrong credentials or
//! comparing a response against out-of-band data. Hooks receive the
//! variant, the results accumulated so far, and the cluster context;
//! nothing else is shared between them.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::client::{ApiError, AuthnClient, PaiClient};
use crate::config::ClusterConfig;

use super::case::ApiTestVariant;
use super::param::{resolve, OperationResults, ResolveError};

/// Cluster-wide handle passed to every hook.
pub struct TestContext {
    pub cluster: ClusterConfig,
    pub client: PaiClient,
}

impl TestContext {
    pub fn new(cluster: ClusterConfig) -> Self {
        let client = PaiClient::new(&cluster);
        Self { cluster, client }
    }
}

/// Errors raised by customized hooks.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Signature shared by every hook.
pub type HookFn = for<'a> fn(
    &'a ApiTestVariant,
    &'a OperationResults,
    &'a TestContext,
) -> BoxFuture<'a, Result<(), HookError>>;

/// Looks up a hook by the name a table entry uses.
pub fn find_hook(name: &str) -> Option<HookFn> {
    match name {
        "logout with incorrect token" => Some(logout_hook),
        "submitted job config round-trips" => Some(job_config_hook),
        _ => None,
    }
}

fn logout_hook<'a>(
    variant: &'a ApiTestVariant,
    results: &'a OperationResults,
    ctx: &'a TestContext,
) -> BoxFuture<'a, Result<(), HookError>> {
    Box::pin(logout_with_incorrect_token(variant, results, ctx))
}

fn job_config_hook<'a>(
    variant: &'a ApiTestVariant,
    results: &'a OperationResults,
    ctx: &'a TestContext,
) -> BoxFuture<'a, Result<(), HookError>> {
    Box::pin(job_config_round_trips(variant, results, ctx))
}

/// A logout presented with a token the cluster never issued must be
/// rejected by the token check, not reach the logout handler.
async fn logout_with_incorrect_token(
    _variant: &ApiTestVariant,
    _results: &OperationResults,
    ctx: &TestContext,
) -> Result<(), HookError> {
    let authn = AuthnClient::new(&ctx.cluster.rest_server_uri, "incorrect-token");
    match authn.basic_logout().await {
        Ok(_) => Err(HookError::Assertion(
            "logout with an incorrect token succeeded".to_string(),
        )),
        Err(err) if err.status() == Some(401) => Ok(()),
        Err(other) => Err(HookError::Assertion(format!(
            "expected 401 Unauthorized, got: {}",
            other
        ))),
    }
}

/// The config route must hand back the protocol a job was submitted
/// with. The variant's operation carries `[username, job name, yaml]`.
async fn job_config_round_trips(
    variant: &ApiTestVariant,
    results: &OperationResults,
    ctx: &TestContext,
) -> Result<(), HookError> {
    let operation = variant.operation.as_ref().ok_or_else(|| {
        HookError::Assertion("hook variant carries no operation data".to_string())
    })?;
    let args = operation
        .parameters
        .iter()
        .map(|spec| resolve(spec, results))
        .collect::<Result<Vec<_>, _>>()?;
    if args.len() != 3 {
        return Err(HookError::Assertion(format!(
            "expected [username, job name, yaml], got {} parameters",
            args.len()
        )));
    }
    let username = args[0]
        .as_str()
        .ok_or_else(|| HookError::Assertion("username is not a string".to_string()))?;
    let name = args[1]
        .as_str()
        .ok_or_else(|| HookError::Assertion("job name is not a string".to_string()))?;
    let submitted = args[2]
        .as_str()
        .ok_or_else(|| HookError::Assertion("protocol is not a string".to_string()))?;

    let fetched = ctx.client.job().get_config(username, name).await?;
    if fetched.trim() != submitted.trim() {
        return Err(HookError::Assertion(format!(
            "stored config differs from the submitted protocol for {}~{}",
            username, name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_hooks_resolve() {
        assert!(find_hook("logout with incorrect token").is_some());
        assert!(find_hook("submitted job config round-trips").is_some());
        assert!(find_hook("no such hook").is_none());
    }
}
