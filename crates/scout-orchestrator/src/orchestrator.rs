use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scout_common::{Mode, Phase};
use scout_events::{DropReason, EarlyStopReason, RunEvent};
use scout_extract::{run_phase_b, ExtractedEntity, StructuredExtract};
use scout_lens::{LensContract, Trigger};
use scout_merge::{group_duplicates, merge_group, Entity, MergeCandidate};
use scout_planner::{plan, ConnectorInvocation, PlanRequest};
use scout_registry::{Adapter, ConnectorFetch, ConnectorRegistry};
use scout_store::Store;

use crate::cancellation::CancellationToken;
use crate::context::ExecutionContext;
use crate::extractor_map::ExtractorRegistry;
use crate::phase_runner::{record_drop, run_phase};
use crate::report::{build_report, Report};
use crate::request::Request;

/// Wall-clock cap on a run regardless of what the caller asks for (spec
/// section 4.4: "Global run timeout = `min(user-specified, 300 s)`").
pub const GLOBAL_RUN_TIMEOUT_CAP: Duration = Duration::from_secs(300);
/// Default per-phase timeout (spec section 4.4).
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(60);

/// Ties the planner, the phase-barrier worker pool, Phase B, and
/// dedup/merge/finalize into one run (spec section 4.4). Generic over the
/// connector transport so tests can swap in `scout_registry::testing::MockConnector`
/// without touching anything else.
pub struct Orchestrator<F: ConnectorFetch> {
    registry: Arc<ConnectorRegistry>,
    adapter: Arc<Adapter<F>>,
    extractors: Arc<ExtractorRegistry>,
    structured_extract: Arc<dyn StructuredExtract>,
    store: Option<Arc<dyn Store>>,
    max_in_flight_per_phase: usize,
    phase_timeout: Duration,
    requested_run_timeout: Duration,
    strict_field_validation: bool,
}

impl<F: ConnectorFetch + 'static> Orchestrator<F> {
    pub fn new(
        registry: ConnectorRegistry,
        adapter: Adapter<F>,
        extractors: ExtractorRegistry,
        structured_extract: Arc<dyn StructuredExtract>,
        store: Option<Arc<dyn Store>>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            adapter: Arc::new(adapter),
            extractors: Arc::new(extractors),
            structured_extract,
            store,
            max_in_flight_per_phase: 4,
            phase_timeout: DEFAULT_PHASE_TIMEOUT,
            requested_run_timeout: GLOBAL_RUN_TIMEOUT_CAP,
            strict_field_validation: false,
        }
    }

    pub fn with_max_in_flight_per_phase(mut self, n: usize) -> Self {
        self.max_in_flight_per_phase = n;
        self
    }

    pub fn with_phase_timeout(mut self, timeout: Duration) -> Self {
        self.phase_timeout = timeout;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.requested_run_timeout = timeout;
        self
    }

    /// Promotes legacy Phase-A field names from a warning to a hard
    /// extraction failure for every connector in this run (spec sections
    /// 4.5, 6's `STRICT_FIELD_VALIDATION`).
    pub fn with_strict_field_validation(mut self, strict: bool) -> Self {
        self.strict_field_validation = strict;
        self
    }

    /// Runs one request to completion. `cancellation` lets an external
    /// caller (the CLI's Ctrl-C handler, a test) cancel mid-phase; the
    /// orchestrator's own early-stop checks use a clone of the same token,
    /// but mark [`ExecutionContext::mark_early_stop`] first so the two
    /// cases stay distinguishable at the end of the run (spec section 8,
    /// scenario F vs. section 4.4's early-stop list).
    pub async fn run(&self, request: Request, lens: Arc<LensContract>, cancellation: CancellationToken) -> Report {
        let lens_hash = scout_lens::hash::lens_hash(&lens);
        let run_timeout = self.requested_run_timeout.min(GLOBAL_RUN_TIMEOUT_CAP);
        let ctx = Arc::new(ExecutionContext::new(
            request,
            Arc::clone(&lens),
            lens_hash,
            run_timeout,
            cancellation,
            self.strict_field_validation,
        ));

        let plan_request = PlanRequest {
            query: ctx.request.query.clone(),
            mode: ctx.request.mode,
            budget_usd: ctx.request.budget_usd,
        };
        let invocations = plan(&plan_request, &lens, &self.registry);
        record_drops(&ctx, &lens, &plan_request, &invocations);

        for phase in Phase::ORDER {
            if ctx.cancellation.is_cancelled() {
                break;
            }

            let phase_invocations: Vec<ConnectorInvocation> = invocations.iter().filter(|i| i.phase == phase).cloned().collect();

            run_phase(
                phase,
                &phase_invocations,
                Arc::clone(&ctx),
                Arc::clone(&self.registry),
                Arc::clone(&self.adapter),
                Arc::clone(&self.extractors),
                self.store.clone(),
                self.max_in_flight_per_phase,
                self.phase_timeout,
            )
            .await;

            if ctx.cancellation.is_cancelled() {
                // Cancelled mid-phase by something other than our own
                // early-stop check below (which only ever fires after a
                // phase has fully drained) — an external cancellation.
                break;
            }

            if let Some(reason) = check_early_stop(&ctx) {
                ctx.events.push(RunEvent::EarlyStop { reason, at: Utc::now() });
                ctx.mark_early_stop();
                ctx.cancellation.cancel();
                break;
            }
        }

        if ctx.cancellation.is_cancelled() && !ctx.was_early_stop() {
            ctx.events.push(RunEvent::RunCancelled { at: Utc::now() });
            ctx.take_candidates();
            return build_report(&ctx, &invocations, 0, Vec::new(), false);
        }

        let mut candidates = ctx.take_candidates();
        let candidate_count = candidates.len();
        self.apply_phase_b(&mut candidates, &lens, &ctx).await;
        for entity in &mut candidates {
            entity.finalize_dimensions();
        }

        let entities = self.merge_all(&candidates);

        let persisted = if ctx.request.persist {
            self.persist_entities(&entities).await
        } else {
            false
        };

        build_report(&ctx, &invocations, candidate_count, entities, persisted)
    }

    async fn apply_phase_b(&self, candidates: &mut [ExtractedEntity], lens: &LensContract, ctx: &ExecutionContext) {
        for entity in candidates.iter_mut() {
            let rule_errors = run_phase_b(entity, lens, self.structured_extract.as_ref()).await;
            for rule_error in rule_errors {
                ctx.events.push(RunEvent::RuleFailed {
                    rule_id: rule_error.rule_id.clone(),
                    source: rule_error.source.clone(),
                    cause: rule_error.cause.clone(),
                });
                if let Some(store) = &self.store {
                    let _ = store
                        .insert_failed_extraction(scout_store::FailedExtractionInput {
                            raw_ingestion_id: None,
                            rule_id: Some(rule_error.rule_id),
                            kind: "extraction_rule".to_string(),
                            message: rule_error.cause,
                        })
                        .await;
                }
            }
        }
    }

    fn merge_all(&self, candidates: &[ExtractedEntity]) -> Vec<Entity> {
        let groups = group_duplicates(candidates);
        let updated_at = Utc::now();

        groups
            .into_iter()
            .map(|member_indices| {
                let merge_candidates: Vec<MergeCandidate> = member_indices
                    .into_iter()
                    .map(|idx| {
                        let record = &candidates[idx];
                        let spec = self.registry.get(&record.source).ok();
                        MergeCandidate {
                            record,
                            trust_tier: spec.map(|s| s.trust_tier).unwrap_or(scout_common::TrustTier::Low),
                            default_priority: spec.map(|s| s.default_priority).unwrap_or(0),
                        }
                    })
                    .collect();
                merge_group(&merge_candidates, updated_at)
            })
            .collect()
    }

    async fn persist_entities(&self, entities: &[Entity]) -> bool {
        let Some(store) = &self.store else { return false };
        let mut all_ok = true;
        for entity in entities {
            if store.upsert_entity(entity).await.is_err() {
                all_ok = false;
            }
        }
        all_ok
    }
}

/// Budget exhausted, wall-clock deadline elapsed, or (in `RESOLVE_ONE`) a
/// high-confidence match has already arrived (spec section 4.4).
fn check_early_stop(ctx: &ExecutionContext) -> Option<EarlyStopReason> {
    if ctx.budget.exhausted() {
        return Some(EarlyStopReason::BudgetExhausted);
    }
    if ctx.budget.deadline_elapsed() {
        return Some(EarlyStopReason::WallClockDeadline);
    }
    if ctx.request.mode == Mode::ResolveOne && ctx.with_candidates(has_high_confidence_match) {
        return Some(EarlyStopReason::HighConfidenceMatch);
    }
    None
}

/// A candidate carrying at least one external id is the strongest
/// available pre-merge signal of a confirmed, specific match (an exact
/// identifier from the source, not a fuzzy name/geo guess) — the
/// definition this orchestrator uses for "high-confidence" in
/// `RESOLVE_ONE` mode.
fn has_high_confidence_match(candidates: &[ExtractedEntity]) -> bool {
    candidates.iter().any(|c| !c.external_ids.is_empty())
}

/// Emits `ConnectorDropped` for every lens connector rule the planner did
/// not schedule: `NoTriggerMatch` if its trigger never matched the query,
/// `BudgetGated` if it matched but the budget gate cut it (spec section
/// 8, scenario D).
fn record_drops(ctx: &ExecutionContext, lens: &LensContract, plan_request: &PlanRequest, invocations: &[ConnectorInvocation]) {
    let scheduled: std::collections::HashSet<&str> = invocations.iter().map(|i| i.connector.as_str()).collect();
    let features = scout_planner::extract_features(&plan_request.query, &lens.vocabulary);

    let mut names: Vec<&String> = lens.connector_rules.keys().collect();
    names.sort();

    for name in names {
        if scheduled.contains(name.as_str()) {
            continue;
        }
        let rule = &lens.connector_rules[name];
        let reason = if trigger_matches(&rule.trigger, &features, plan_request.mode) {
            DropReason::BudgetGated
        } else {
            DropReason::NoTriggerMatch
        };
        record_drop(ctx, name, reason);
    }
}

/// Mirrors `scout_planner::plan`'s own (private) trigger evaluation so
/// drop reasons can be attributed without the planner needing to expose
/// which connectors it considered and rejected.
fn trigger_matches(trigger: &Trigger, features: &scout_planner::QueryFeatures, mode: Mode) -> bool {
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

#[cfg(test)]
mod tests {
    use super::*;
    use scout_common::TrustTier;
    use scout_lens::{Applicability, CanonicalValues, ConnectorRule, MappingRule};
    use scout_registry::testing::MockConnector;
    use scout_registry::{ConnectorSpec, RateLimit, SourceError};
    use scout_store::testing::FakeStore;
    use serde_json::json;
    use std::collections::HashMap;

    fn connector_spec(name: &str, trust: TrustTier, cost: f64, priority: i32) -> ConnectorSpec {
        ConnectorSpec {
            name: name.to_string(),
            phase: Phase::Discovery,
            cost_per_call_usd: cost,
            trust_tier: trust,
            default_priority: priority,
            timeout: Duration::from_secs(5),
            rate_limit: RateLimit {
                per_minute: 600,
                per_hour: 10_000,
            },
        }
    }

    fn lens_triggered_by(keyword: &str, connectors: &[&str]) -> LensContract {
        let mut connector_rules = HashMap::new();
        for name in connectors {
            connector_rules.insert(
                name.to_string(),
                ConnectorRule {
                    trigger: Trigger {
                        any_keywords: vec![keyword.to_string()],
                        mode: None,
                    },
                    params: serde_json::Value::Null,
                    expected_calls: 1,
                },
            );
        }
        LensContract {
            lens_id: "test-lens".to_string(),
            vocabulary: scout_lens::Vocabulary {
                category_terms: vec![keyword.to_string()],
                location_terms: vec![],
            },
            connector_rules,
            mapping_rules: vec![MappingRule {
                id: "activity.football".to_string(),
                pattern: "sports_complex".to_string(),
                dimension: scout_common::Dimension::CanonicalActivities,
                value: "football".to_string(),
                source_fields: vec!["kind".to_string()],
                confidence: 0.9,
                applicability: Applicability::default(),
            }],
            canonical_values: CanonicalValues {
                values: HashMap::from([(
                    scout_common::Dimension::CanonicalActivities,
                    HashMap::from([("football".to_string(), "Football".to_string())]),
                )]),
            },
            modules: HashMap::new(),
            module_triggers: vec![],
            validation_entity: "Powerleague Portobello".to_string(),
        }
    }

    fn orchestrator_with(
        registry: ConnectorRegistry,
        mock: MockConnector,
        store: Arc<FakeStore>,
    ) -> Orchestrator<MockConnector> {
        Orchestrator::new(
            registry,
            Adapter::new(mock),
            ExtractorRegistry::new(),
            Arc::new(scout_extract::testing::MockStructuredExtract::new()),
            Some(store as Arc<dyn Store>),
        )
    }

    #[tokio::test]
    async fn two_source_merge_trust_wins() {
        let mut registry = ConnectorRegistry::new();
        registry.register(connector_spec("google_places", TrustTier::High, 0.0, 10));
        registry.register(connector_spec("serper", TrustTier::Medium, 0.0, 20));

        let mock = MockConnector::new();
        mock.push_response(
            "google_places",
            "https://example/google",
            json!({"entity_name": "Powerleague Portobello", "phone": null, "kind": "sports_complex"}),
        );
        mock.push_response(
            "serper",
            "https://example/serper",
            json!({"entity_name": "Powerleague Portobello", "phone": "0131 000 0000", "website_url": "http://example/"}),
        );

        let store = Arc::new(FakeStore::new());
        let orchestrator = orchestrator_with(registry, mock, Arc::clone(&store));
        let lens = Arc::new(lens_triggered_by("football", &["google_places", "serper"]));

        let mut request = Request::new("football pitches edinburgh", Mode::DiscoverMany);
        request.persist = true;

        let report = orchestrator.run(request, lens, CancellationToken::new()).await;

        assert_eq!(report.entities.len(), 1);
        let entity = &report.entities[0];
        assert_eq!(entity.primitives.phone.as_deref(), Some("0131 000 0000"));
        assert_eq!(entity.primitives.entity_name.as_deref(), Some("Powerleague Portobello"));
        assert_eq!(entity.source_info["phone"].source, "serper");
        assert_eq!(entity.source_info["entity_name"].source, "google_places");
        assert_eq!(entity.discovered_by, vec!["google_places".to_string(), "serper".to_string()]);
        assert_eq!(store.entity_count(), 1);
    }

    #[tokio::test]
    async fn rate_limited_source_is_isolated_and_run_still_completes() {
        let mut registry = ConnectorRegistry::new();
        registry.register(connector_spec("google_places", TrustTier::High, 0.0, 10));
        registry.register(connector_spec("serper", TrustTier::Medium, 0.0, 20));

        let mock = MockConnector::new();
        mock.push_failure("serper", SourceError::rate_limited("429 from upstream"));
        mock.push_response(
            "google_places",
            "https://example/google",
            json!({"entity_name": "Powerleague Portobello", "kind": "sports_complex"}),
        );

        let store = Arc::new(FakeStore::new());
        let orchestrator = orchestrator_with(registry, mock, Arc::clone(&store));
        let lens = Arc::new(lens_triggered_by("football", &["google_places", "serper"]));

        let mut request = Request::new("football pitches edinburgh", Mode::DiscoverMany);
        request.persist = true;

        let report = orchestrator.run(request, lens, CancellationToken::new()).await;

        assert_eq!(report.entities.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].source, "serper");
        assert_eq!(report.errors[0].kind, "rate_limited");
        assert_eq!(store.entity_count(), 1);
    }

    #[tokio::test]
    async fn zero_budget_drops_every_paid_connector() {
        let mut registry = ConnectorRegistry::new();
        registry.register(connector_spec("serper", TrustTier::Medium, 0.01, 10));
        registry.register(connector_spec("google_places", TrustTier::High, 0.017, 20));
        registry.register(connector_spec("osm", TrustTier::Low, 0.0, 30));

        let mock = MockConnector::new();
        mock.push_response("osm", "https://example/osm", json!({"entity_name": "Powerleague Portobello"}));

        let store = Arc::new(FakeStore::new());
        let orchestrator = orchestrator_with(registry, mock, Arc::clone(&store));
        let lens = Arc::new(lens_triggered_by("football", &["serper", "google_places", "osm"]));

        let mut request = Request::new("football pitches edinburgh", Mode::DiscoverMany);
        request.budget_usd = Some(0.0);

        let report = orchestrator.run(request, lens, CancellationToken::new()).await;

        assert_eq!(report.selected_connectors, vec!["osm".to_string()]);
        let dropped: Vec<_> = report
            .events
            .iter()
            .filter_map(|e| match e {
                RunEvent::ConnectorDropped { connector, reason } => Some((connector.clone(), *reason)),
                _ => None,
            })
            .collect();
        assert_eq!(dropped.len(), 2);
        assert!(dropped.iter().all(|(_, reason)| *reason == DropReason::BudgetGated));
    }

    #[tokio::test]
    async fn pre_cancelled_run_discards_everything() {
        let mut registry = ConnectorRegistry::new();
        registry.register(connector_spec("google_places", TrustTier::High, 0.0, 10));

        let mock = MockConnector::new();
        mock.push_response(
            "google_places",
            "https://example/google",
            json!({"entity_name": "Powerleague Portobello", "kind": "sports_complex"}),
        );

        let store = Arc::new(FakeStore::new());
        let orchestrator = orchestrator_with(registry, mock, Arc::clone(&store));
        let lens = Arc::new(lens_triggered_by("football", &["google_places"]));

        let token = CancellationToken::new();
        token.cancel();

        let request = Request::new("football pitches edinburgh", Mode::DiscoverMany);
        let report = orchestrator.run(request, lens, token).await;

        assert!(report.entities.is_empty());
        assert!(!report.persisted);
        assert_eq!(store.entity_count(), 0);
        assert!(report.events.iter().any(|e| matches!(e, RunEvent::RunCancelled { .. })));
    }

    #[tokio::test]
    async fn zero_budget_early_stop_is_not_reported_as_cancelled() {
        let mut registry = ConnectorRegistry::new();
        registry.register(connector_spec("osm", TrustTier::Low, 0.0, 30));

        let mock = MockConnector::new();
        mock.push_response("osm", "https://example/osm", json!({"entity_name": "Powerleague Portobello"}));

        let store = Arc::new(FakeStore::new());
        let orchestrator = orchestrator_with(registry, mock, Arc::clone(&store));
        let lens = Arc::new(lens_triggered_by("football", &["osm"]));

        let mut request = Request::new("football pitches edinburgh", Mode::DiscoverMany);
        request.budget_usd = Some(0.0);

        let report = orchestrator.run(request, lens, CancellationToken::new()).await;

        assert_eq!(report.entities.len(), 1);
        assert!(!report.events.iter().any(|e| matches!(e, RunEvent::RunCancelled { .. })));
    }

    #[tokio::test]
    async fn strict_field_validation_fails_legacy_field_extraction() {
        let mut registry = ConnectorRegistry::new();
        registry.register(connector_spec("google_places", TrustTier::High, 0.0, 10));

        let mock = MockConnector::new();
        mock.push_response(
            "google_places",
            "https://example/google",
            json!({"location_lat": 55.9, "kind": "sports_complex"}),
        );

        let store = Arc::new(FakeStore::new());
        let orchestrator = orchestrator_with(registry, mock, Arc::clone(&store)).with_strict_field_validation(true);
        let lens = Arc::new(lens_triggered_by("football", &["google_places"]));

        let request = Request::new("football pitches edinburgh", Mode::DiscoverMany);
        let report = orchestrator.run(request, lens, CancellationToken::new()).await;

        assert!(report.entities.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, "malformed");
        assert_eq!(store.failed_extraction_count(), 1);
    }
}
