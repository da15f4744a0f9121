use scout_common::{Mode, Phase, TrustTier};
use scout_lens::{LensContract, Trigger};
use scout_registry::ConnectorRegistry;
use serde::{Deserialize, Serialize};

use crate::feature::{extract_features, QueryFeatures};
use crate::request::PlanRequest;

/// One scheduled connector call, ordered by `(phase, priority)` (spec
/// section 4.3). Output of [`plan`] is deterministic: same lens, request,
/// and registry always produce byte-identical invocations in the same
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorInvocation {
    pub connector: String,
    pub phase: Phase,
    pub priority: i32,
    pub params: serde_json::Value,
}

/// `RESOLVE_ONE` boosts high-trust enrichment connectors ahead of lower-trust
/// ones within their phase; the multiplier keeps the shift large enough to
/// beat any plausible `default_priority` spread without overflowing i32.
const TRUST_PRIORITY_WEIGHT: i32 = 1000;

pub fn plan(request: &PlanRequest, lens: &LensContract, registry: &ConnectorRegistry) -> Vec<ConnectorInvocation> {
    let features = extract_features(&request.query, &lens.vocabulary);

    let mut candidates: Vec<(ConnectorInvocation, f64, bool)> = Vec::new();

    // Iterate in sorted key order — HashMap iteration order is not stable
    // across runs, and the plan must be byte-identical for the same inputs.
    let mut connector_names: Vec<&String> = lens.connector_rules.keys().collect();
    connector_names.sort();

    for name in connector_names {
        let rule = &lens.connector_rules[name];
        if !trigger_matches(&rule.trigger, &features, request.mode) {
            continue;
        }

        let spec = match registry.get(name) {
            Ok(spec) => spec,
            Err(_) => {
                tracing::warn!(connector = name, "lens references connector missing from registry; skipping");
                continue;
            }
        };

        let priority = effective_priority(spec.default_priority, spec.phase, spec.trust_tier, request.mode);
        let cost = spec.cost_per_call_usd * rule.expected_calls as f64;

        candidates.push((
            ConnectorInvocation {
                connector: name.clone(),
                phase: spec.phase,
                priority,
                params: rule.params.clone(),
            },
            cost,
            spec.is_free(),
        ));
    }

    let mut selected = apply_budget_gate(candidates, request.budget_usd);

    selected.sort_by(|a, b| {
        phase_order_index(a.phase)
            .cmp(&phase_order_index(b.phase))
            .then(a.priority.cmp(&b.priority))
            .then(a.connector.cmp(&b.connector))
    });

    selected
}

fn trigger_matches(trigger: &Trigger, features: &QueryFeatures, mode: Mode) -> bool {
    if let Some(required_mode) = trigger.mode {
        if required_mode != mode {
            return false;
        }
    }

    if trigger.any_keywords.is_empty() {
        return true;
    }

    trigger
        .any_keywords
        .iter()
        .any(|kw| features.keywords.contains(&kw.to_lowercase()) || features.locations.contains(&kw.to_lowercase()))
}

/// `RESOLVE_ONE` favours high-trust enrichment connectors first;
/// `DISCOVER_MANY` leaves discovery connectors at their declared priority
/// so the broadest, cheapest sweep runs first (spec section 4.3). Lower
/// numeric priority sorts first.
fn effective_priority(default_priority: i32, phase: Phase, trust_tier: TrustTier, mode: Mode) -> i32 {
    match (mode, phase) {
        (Mode::ResolveOne, Phase::Enrichment) => {
            default_priority - i32::from(trust_tier.rank()) * TRUST_PRIORITY_WEIGHT
        }
        _ => default_priority,
    }
}

fn phase_order_index(phase: Phase) -> usize {
    Phase::ORDER.iter().position(|p| *p == phase).unwrap_or(Phase::ORDER.len())
}

/// Sum `cost_per_call_usd * expected_calls` across selected connectors;
/// drop connectors in descending cost order until the sum fits the budget.
/// Free connectors are never dropped (spec section 4.3).
fn apply_budget_gate(
    mut candidates: Vec<(ConnectorInvocation, f64, bool)>,
    budget_usd: Option<f64>,
) -> Vec<ConnectorInvocation> {
    let Some(budget) = budget_usd else {
        return candidates.into_iter().map(|(inv, _, _)| inv).collect();
    };

    let mut total: f64 = candidates.iter().map(|(_, cost, _)| cost).sum();
    if total <= budget {
        return candidates.into_iter().map(|(inv, _, _)| inv).collect();
    }

    // Descending cost, ties broken by connector name for determinism.
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.connector.cmp(&b.0.connector)));

    let mut kept = Vec::with_capacity(candidates.len());
    for (inv, cost, is_free) in candidates {
        if !is_free && total > budget {
            total -= cost;
            tracing::info!(connector = inv.connector, cost_usd = cost, "dropped by budget gate");
            continue;
        }
        kept.push(inv);
    }
    kept
}
