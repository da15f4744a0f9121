use std::collections::HashMap;

use crate::error::{SourceError, SourceErrorKind};
use crate::spec::ConnectorSpec;

/// Immutable, process-global registry of connector specs. Built once at
/// bootstrap via `register`, then only ever read (spec section 5).
#[derive(Debug, Default)]
pub struct ConnectorRegistry {
    specs: HashMap<String, ConnectorSpec>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ConnectorSpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, name: &str) -> Result<&ConnectorSpec, SourceError> {
        self.specs
            .get(name)
            .ok_or_else(|| SourceError::new(SourceErrorKind::NotFound, format!("unknown connector: {name}")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectorSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::RateLimit;
    use scout_common::{Phase, TrustTier};
    use std::time::Duration;

    fn spec(name: &str) -> ConnectorSpec {
        ConnectorSpec {
            name: name.to_string(),
            phase: Phase::Discovery,
            cost_per_call_usd: 0.01,
            trust_tier: TrustTier::Medium,
            default_priority: 10,
            timeout: Duration::from_secs(5),
            rate_limit: RateLimit {
                per_minute: 60,
                per_hour: 1000,
            },
        }
    }

    #[test]
    fn get_unregistered_connector_fails() {
        let registry = ConnectorRegistry::new();
        let err = registry.get("serper").unwrap_err();
        assert_eq!(err.kind, SourceErrorKind::NotFound);
    }

    #[test]
    fn register_then_get_round_trips() {
        let mut registry = ConnectorRegistry::new();
        registry.register(spec("serper"));
        assert!(registry.contains("serper"));
        assert_eq!(registry.get("serper").unwrap().name, "serper");
    }
}
