use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use scout_common::Phase;
use scout_events::{DropReason, ErrorRecord, RunEvent};
use scout_extract::{extract_primitives, infer_entity_class, ExtractedEntity};
use scout_planner::ConnectorInvocation;
use scout_registry::{Adapter, ConnectorFetch, ConnectorRegistry};
use scout_store::{FailedExtractionInput, RawIngestionInput, Store};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info_span, Instrument};

use crate::context::ExecutionContext;
use crate::extractor_map::ExtractorRegistry;
use crate::metrics::ConnectorStatus;

/// Runs every connector invocation scheduled for one phase to completion,
/// cancellation, or failure — a phase barrier (spec section 4.4: "all work
/// of phase N completes or is cancelled before phase N+1 begins"). Persists
/// raw ingestions and per-record extractions unconditionally; whether the
/// *final* entity gets upserted is `ctx.request.persist`'s call, made later.
pub async fn run_phase<F: ConnectorFetch + 'static>(
    phase: Phase,
    invocations: &[ConnectorInvocation],
    ctx: Arc<ExecutionContext>,
    registry: Arc<ConnectorRegistry>,
    adapter: Arc<Adapter<F>>,
    extractors: Arc<ExtractorRegistry>,
    store: Option<Arc<dyn Store>>,
    max_in_flight: usize,
    phase_timeout: Duration,
) {
    let phase_span = info_span!("phase", phase = ?phase);
    let _entered = phase_span.enter();

    ctx.events.push(RunEvent::PhaseStarted { phase, at: Utc::now() });

    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut workers: JoinSet<()> = JoinSet::new();

    for invocation in invocations {
        let invocation = invocation.clone();
        let ctx = Arc::clone(&ctx);
        let registry = Arc::clone(&registry);
        let adapter = Arc::clone(&adapter);
        let extractors = Arc::clone(&extractors);
        let store = store.clone();
        let permit = Arc::clone(&semaphore).acquire_owned().await.expect("semaphore never closed mid-run");

        ctx.events.push(RunEvent::ConnectorScheduled {
            connector: invocation.connector.clone(),
            phase,
        });
        ctx.metrics.record(&invocation.connector, |m| {
            m.phase = Some(phase);
            m.status = ConnectorStatus::Scheduled;
        });

        let connector_span = info_span!("connector", name = %invocation.connector);
        workers.spawn(
            async move {
                let _permit = permit;
                run_one(invocation, ctx, registry, adapter, extractors, store, phase_timeout).await;
            }
            .instrument(connector_span),
        );
    }

    while workers.join_next().await.is_some() {}

    ctx.events.push(RunEvent::PhaseCompleted { phase, at: Utc::now() });
}

async fn run_one<F: ConnectorFetch + 'static>(
    invocation: ConnectorInvocation,
    ctx: Arc<ExecutionContext>,
    registry: Arc<ConnectorRegistry>,
    adapter: Arc<Adapter<F>>,
    extractors: Arc<ExtractorRegistry>,
    store: Option<Arc<dyn Store>>,
    phase_timeout: Duration,
) {
    let connector = invocation.connector.as_str();
    let budget = phase_timeout.min(ctx.budget.time_remaining());
    let started = Instant::now();

    ctx.metrics.record(connector, |m| m.status = ConnectorStatus::Scheduled);
    ctx.events.push(RunEvent::ConnectorStarted {
        connector: connector.to_string(),
        at: Utc::now(),
    });

    let fetch = adapter.fetch(&registry, connector, invocation.params.clone(), budget);

    let outcome = tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => None,
        result = fetch => Some(result),
    };

    let Some(result) = outcome else {
        ctx.metrics.record(connector, |m| {
            m.status = ConnectorStatus::Cancelled;
            m.latency = Some(started.elapsed());
        });
        ctx.events.push(RunEvent::ConnectorCancelled {
            connector: connector.to_string(),
            at: Utc::now(),
        });
        return;
    };

    let raw = match result {
        Ok(raw) => raw,
        Err(err) => {
            ctx.metrics.record(connector, |m| {
                m.status = ConnectorStatus::Failed;
                m.latency = Some(started.elapsed());
            });
            ctx.errors.push(ErrorRecord::new(connector, err.kind.as_str(), err.cause.clone()));
            ctx.events.push(RunEvent::ConnectorFailed {
                connector: connector.to_string(),
                kind: err.kind.as_str().to_string(),
                message: err.cause,
                at: Utc::now(),
            });
            return;
        }
    };

    let cost_usd = registry.get(connector).map(|spec| spec.cost_per_call_usd).unwrap_or(0.0);
    ctx.budget.spend(cost_usd);

    let raw_ingestion_id = if let Some(store) = &store {
        match store
            .insert_raw_ingestion(RawIngestionInput {
                source: raw.source.clone(),
                url: raw.url.clone(),
                fetched_at: raw.fetched_at,
                sha256: raw.sha256.clone(),
                payload: raw.payload_blob.clone(),
            })
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                ctx.errors.push(ErrorRecord::new(connector, "persistence", e.to_string()));
                None
            }
        }
    } else {
        None
    };

    let field_map = extractors.get(connector);
    let extraction = match extract_primitives(connector, &raw.payload_blob, &field_map, ctx.strict_field_validation) {
        Ok(extraction) => extraction,
        Err(err) => {
            ctx.metrics.record(connector, |m| {
                m.status = ConnectorStatus::Failed;
                m.latency = Some(started.elapsed());
                m.cost_usd = cost_usd;
            });
            ctx.errors.push(ErrorRecord::new(connector, "malformed", err.0.clone()));
            ctx.events.push(RunEvent::ConnectorFailed {
                connector: connector.to_string(),
                kind: "malformed".to_string(),
                message: err.0.clone(),
                at: Utc::now(),
            });
            if let Some(store) = &store {
                let _ = store
                    .insert_failed_extraction(FailedExtractionInput {
                        raw_ingestion_id,
                        rule_id: None,
                        kind: "phase_a_legacy_field".to_string(),
                        message: err.0,
                    })
                    .await;
            }
            return;
        }
    };
    for warning in &extraction.legacy_warnings {
        tracing::warn!(source = %warning.source, field = %warning.field, "legacy field name");
    }

    let entity_class = infer_entity_class(&extraction.primitives, &extraction.raw_observations);
    let entity = ExtractedEntity::new(
        connector,
        raw.sha256.clone(),
        entity_class,
        extraction.primitives,
        extraction.raw_observations,
        extraction.external_ids,
    );

    if let Some(store) = &store {
        if let Some(raw_ingestion_id) = raw_ingestion_id {
            if let Err(e) = store.insert_extracted_entity(raw_ingestion_id, connector, &entity).await {
                ctx.errors.push(ErrorRecord::new(connector, "persistence", e.to_string()));
            }
        }
    }

    ctx.metrics.record(connector, |m| {
        m.status = ConnectorStatus::Succeeded;
        m.latency = Some(started.elapsed());
        m.cost_usd = cost_usd;
        m.candidate_count = 1;
    });
    ctx.events.push(RunEvent::ConnectorCompleted {
        connector: connector.to_string(),
        candidate_count: 1,
        at: Utc::now(),
    });

    ctx.push_candidates(vec![entity]);
}

/// Emits a `ConnectorDropped` event for a connector the planner did not
/// schedule for this run (spec section 4.3's budget gate, or a trigger
/// that never matched).
pub fn record_drop(ctx: &ExecutionContext, connector: &str, reason: DropReason) {
    ctx.events.push(RunEvent::ConnectorDropped {
        connector: connector.to_string(),
        reason,
    });
}
