//! Registers connector *metadata* (spec section 3's `ConnectorSpec`) from
//! `config/connectors.yaml` at bootstrap. This is distinct from a
//! connector's fetch *logic*, which stays out of tree
//! ([`crate::connectors::UnimplementedConnector`]) — the registry only
//! needs to know a connector's phase, cost, trust tier, and rate limit to
//! let the planner and lens validator do their job; an operator can wire
//! a lens and see it validate and plan correctly before a single real
//! connector exists.

use std::path::Path;

use scout_registry::{ConnectorRegistry, ConnectorSpec};

/// Reads `path` into a registry. A missing file yields an empty registry
/// (every lens that references a connector will then fail gate 3 at load
/// time, which is the correct, loud failure mode for "nothing is
/// configured yet").
pub fn load_registry(path: &Path) -> anyhow::Result<ConnectorRegistry> {
    let mut registry = ConnectorRegistry::new();
    if !path.exists() {
        return Ok(registry);
    }

    let raw = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("could not read {}: {e}", path.display()))?;
    let specs: Vec<ConnectorSpec> =
        serde_yaml::from_str(&raw).map_err(|e| anyhow::anyhow!("malformed {}: {e}", path.display()))?;
    for spec in specs {
        registry.register(spec);
    }
    Ok(registry)
}
