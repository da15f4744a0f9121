use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scout_events::{ErrorLog, EventLog};
use scout_extract::ExtractedEntity;
use scout_lens::LensContract;

use crate::budget::BudgetTracker;
use crate::cancellation::CancellationToken;
use crate::metrics::MetricsMap;
use crate::request::Request;

/// Mutable, single-owner, one-per-run state (spec section 3). Every field
/// here is shared by reference across phase workers; each one picks its
/// own lock granularity rather than sharing a single mutex for everything.
pub struct ExecutionContext {
    pub request: Request,
    pub lens_contract: Arc<LensContract>,
    pub lens_hash: String,
    pub metrics: MetricsMap,
    pub errors: ErrorLog,
    pub events: EventLog,
    pub budget: BudgetTracker,
    pub cancellation: CancellationToken,
    /// Promotes legacy Phase-A field names from a warning to a hard
    /// extraction failure (spec sections 4.5, 6).
    pub strict_field_validation: bool,
    candidates: Mutex<Vec<ExtractedEntity>>,
    /// Set only by the orchestrator's own phase-boundary early-stop check
    /// (spec section 4.4). Distinguishes "we chose to stop, keep what we
    /// have" from a cancellation that arrived from outside mid-phase,
    /// which discards everything gathered so far (spec section 8,
    /// scenario F).
    early_stop: AtomicBool,
}

impl ExecutionContext {
    pub fn new(
        request: Request,
        lens_contract: Arc<LensContract>,
        lens_hash: String,
        run_timeout: Duration,
        cancellation: CancellationToken,
        strict_field_validation: bool,
    ) -> Self {
        let budget = BudgetTracker::new(request.budget_usd, run_timeout);
        Self {
            request,
            lens_contract,
            lens_hash,
            metrics: MetricsMap::new(),
            errors: ErrorLog::new(),
            events: EventLog::new(),
            budget,
            cancellation,
            strict_field_validation,
            candidates: Mutex::new(Vec::new()),
            early_stop: AtomicBool::new(false),
        }
    }

    pub fn mark_early_stop(&self) {
        self.early_stop.store(true, Ordering::SeqCst);
    }

    pub fn was_early_stop(&self) -> bool {
        self.early_stop.load(Ordering::SeqCst)
    }

    /// Appends candidates produced by one connector. Mirrors the spec's
    /// "append-only channel, no shared-writer lock on the slice" by
    /// keeping the critical section to a single `extend`.
    pub fn push_candidates(&self, items: Vec<ExtractedEntity>) {
        self.candidates.lock().expect("candidates mutex poisoned").extend(items);
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.lock().expect("candidates mutex poisoned").len()
    }

    /// Drains every candidate collected so far.
    pub fn take_candidates(&self) -> Vec<ExtractedEntity> {
        std::mem::take(&mut self.candidates.lock().expect("candidates mutex poisoned"))
    }

    /// Read-only access without draining, so an early-stop check (spec
    /// section 4.4: "`RESOLVE_ONE` mode reached a high-confidence match")
    /// can inspect what has arrived so far without disturbing later phases.
    pub fn with_candidates<R>(&self, f: impl FnOnce(&[ExtractedEntity]) -> R) -> R {
        let guard = self.candidates.lock().expect("candidates mutex poisoned");
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_common::Mode;
    use scout_lens::fixtures::valid_lens;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(
            Request::new("padel courts edinburgh", Mode::DiscoverMany),
            Arc::new(valid_lens()),
            "deadbeef".to_string(),
            Duration::from_secs(60),
            CancellationToken::new(),
            false,
        )
    }

    #[test]
    fn early_stop_marker_starts_false() {
        let ctx = ctx();
        assert!(!ctx.was_early_stop());
        ctx.mark_early_stop();
        assert!(ctx.was_early_stop());
    }

    #[test]
    fn push_and_take_candidates_round_trips() {
        use scout_common::EntityClass;
        use scout_extract::Primitives;

        let ctx = ctx();
        assert_eq!(ctx.candidate_count(), 0);
        ctx.push_candidates(vec![ExtractedEntity::new(
            "google_places",
            "sha",
            EntityClass::Place,
            Primitives::default(),
            serde_json::Map::new(),
            Default::default(),
        )]);
        assert_eq!(ctx.candidate_count(), 1);
        let drained = ctx.take_candidates();
        assert_eq!(drained.len(), 1);
        assert_eq!(ctx.candidate_count(), 0);
    }
}
