use std::collections::HashMap;

use scout_events::{ErrorRecord, RunEvent};
use scout_merge::Entity;
use scout_planner::ConnectorInvocation;

use crate::context::ExecutionContext;
use crate::metrics::ConnectorMetrics;

/// The user-visible result of a run (spec section 7: "selected connectors;
/// per-connector latency/cost/count/status; candidates found; final
/// entities; persistence outcomes; and an enumerated error list. No stack
/// traces in user output."). Every field here is already display-ready —
/// the CLI formats this directly without touching `ExecutionContext`.
#[derive(Debug, Clone)]
pub struct Report {
    pub lens_id: String,
    pub lens_hash: String,
    pub selected_connectors: Vec<String>,
    pub connector_metrics: HashMap<String, ConnectorMetrics>,
    pub candidate_count: usize,
    pub entities: Vec<Entity>,
    pub persisted: bool,
    pub errors: Vec<ErrorRecord>,
    pub events: Vec<RunEvent>,
}

impl Report {
    /// A run succeeds if it produced at least one entity or was explicitly
    /// a no-results query (spec section 7) — the orchestrator itself never
    /// knows "no-results was expected", so that second half of the rule is
    /// the CLI's call to make; this only reports whether any entity
    /// persisted.
    pub fn produced_results(&self) -> bool {
        !self.entities.is_empty()
    }

    pub fn all_connectors_failed(&self) -> bool {
        !self.selected_connectors.is_empty()
            && self
                .selected_connectors
                .iter()
                .all(|c| matches!(self.connector_metrics.get(c).map(|m| m.status), Some(crate::metrics::ConnectorStatus::Failed)))
    }
}

pub fn build_report(
    ctx: &ExecutionContext,
    invocations: &[ConnectorInvocation],
    candidate_count: usize,
    entities: Vec<Entity>,
    persisted: bool,
) -> Report {
    Report {
        lens_id: ctx.lens_contract.lens_id.clone(),
        lens_hash: ctx.lens_hash.clone(),
        selected_connectors: invocations.iter().map(|i| i.connector.clone()).collect(),
        connector_metrics: ctx.metrics.snapshot(),
        candidate_count,
        entities,
        persisted,
        errors: ctx.errors.snapshot(),
        events: ctx.events.snapshot(),
    }
}
