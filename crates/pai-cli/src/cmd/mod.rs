pub mod cluster;
pub mod job;
pub mod token;

use color_eyre::eyre::Result;
use pai_core::ClusterConfig;

use crate::clusters::ClusterRegistry;

/// Picks the cluster a command talks to: an explicit `--cluster` alias
/// wins, then a `PAI_CLUSTER_FILE` environment override, then the
/// first registered cluster.
pub fn select_cluster(registry: &ClusterRegistry, alias: Option<&str>) -> Result<ClusterConfig> {
    if let Some(alias) = alias {
        return Ok(registry.get(alias)?.config);
    }
    if std::env::var(pai_core::config::ENV_CLUSTER_FILE).is_ok() {
        return Ok(ClusterConfig::load()?);
    }
    Ok(registry.default_cluster()?.config)
}
