use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Per-connector outcome, updated exactly once per invocation (spec
/// section 4.4: "records latency/cost/count into `ctx.metrics` under a
/// per-connector lock").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorMetrics {
    pub phase: Option<scout_common::Phase>,
    pub latency: Option<Duration>,
    pub cost_usd: f64,
    pub candidate_count: usize,
    pub status: ConnectorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectorStatus {
    #[default]
    Scheduled,
    Succeeded,
    Failed,
    Cancelled,
    Dropped,
}

impl ConnectorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectorStatus::Scheduled => "scheduled",
            ConnectorStatus::Succeeded => "succeeded",
            ConnectorStatus::Failed => "failed",
            ConnectorStatus::Cancelled => "cancelled",
            ConnectorStatus::Dropped => "dropped",
        }
    }
}

/// One `Mutex<HashMap<..>>` keyed by connector name. The spec allows
/// either "per-key locking" or "an atomic map"; a single mutex guarding
/// the whole map is the teacher crate's own convention for this class of
/// shared state (see `scout_events::EventLog`) and the map never grows
/// past one entry per planned connector, so lock contention is not a
/// concern at this scale.
#[derive(Default)]
pub struct MetricsMap(Mutex<HashMap<String, ConnectorMetrics>>);

impl MetricsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, connector: &str, f: impl FnOnce(&mut ConnectorMetrics)) {
        let mut map = self.0.lock().expect("metrics mutex poisoned");
        let entry = map.entry(connector.to_string()).or_default();
        f(entry);
    }

    pub fn snapshot(&self) -> HashMap<String, ConnectorMetrics> {
        self.0.lock().expect("metrics mutex poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_initialises_and_updates_in_place() {
        let metrics = MetricsMap::new();
        metrics.record("serper", |m| m.status = ConnectorStatus::Scheduled);
        metrics.record("serper", |m| {
            m.status = ConnectorStatus::Succeeded;
            m.candidate_count = 3;
        });
        let snap = metrics.snapshot();
        assert_eq!(snap["serper"].status, ConnectorStatus::Succeeded);
        assert_eq!(snap["serper"].candidate_count, 3);
    }

    #[test]
    fn different_connectors_do_not_clobber_each_other() {
        let metrics = MetricsMap::new();
        metrics.record("serper", |m| m.candidate_count = 1);
        metrics.record("google_places", |m| m.candidate_count = 2);
        let snap = metrics.snapshot();
        assert_eq!(snap["serper"].candidate_count, 1);
        assert_eq!(snap["google_places"].candidate_count, 2);
    }
}
