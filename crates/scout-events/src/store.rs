use std::sync::Mutex;

use crate::types::{ErrorRecord, RunEvent};

/// Append-only narration log. One per run, shared read-only after the run
/// ends; writes during the run are serialised by the internal mutex so
/// concurrent phase workers never race on push (spec section 5: "errors
/// is append-only under a single lock" — the same rule applies here).
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<RunEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: RunEvent) {
        self.events.lock().expect("event log mutex poisoned").push(event);
    }

    pub fn snapshot(&self) -> Vec<RunEvent> {
        self.events.lock().expect("event log mutex poisoned").clone()
    }
}

/// Append-only error log backing `ExecutionContext.errors` (spec section
/// 3). Distinct mutex from `EventLog` so a noisy narration stream never
/// contends with the small, load-bearing error list.
#[derive(Default)]
pub struct ErrorLog {
    errors: Mutex<Vec<ErrorRecord>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: ErrorRecord) {
        self.errors.lock().expect("error log mutex poisoned").push(record);
    }

    pub fn snapshot(&self) -> Vec<ErrorRecord> {
        self.errors.lock().expect("error log mutex poisoned").clone()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().expect("error log mutex poisoned").is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().expect("error log mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scout_common::Phase;

    #[test]
    fn events_preserve_push_order() {
        let log = EventLog::new();
        log.push(RunEvent::PhaseStarted {
            phase: Phase::Discovery,
            at: Utc::now(),
        });
        log.push(RunEvent::PhaseCompleted {
            phase: Phase::Discovery,
            at: Utc::now(),
        });
        let snap = log.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(matches!(snap[0], RunEvent::PhaseStarted { .. }));
        assert!(matches!(snap[1], RunEvent::PhaseCompleted { .. }));
    }

    #[test]
    fn errors_accumulate_without_aborting() {
        let log = ErrorLog::new();
        assert!(log.is_empty());
        log.push(ErrorRecord::new("serper", "rate_limited", "429 from upstream"));
        log.push(ErrorRecord::new("google_places", "timeout", "deadline exceeded"));
        assert_eq!(log.len(), 2);
    }
}
