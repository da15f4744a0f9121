use chrono::{DateTime, Utc};
use scout_common::Phase;
use serde::{Deserialize, Serialize};

/// A narration event emitted by the orchestrator as a run proceeds.
/// Consumed by the CLI report and by tests asserting on cancellation /
/// budget-gating behaviour (spec section 8, properties 6 and 10).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    PhaseStarted {
        phase: Phase,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        phase: Phase,
        at: DateTime<Utc>,
    },
    ConnectorScheduled {
        connector: String,
        phase: Phase,
    },
    ConnectorDropped {
        connector: String,
        reason: DropReason,
    },
    ConnectorStarted {
        connector: String,
        at: DateTime<Utc>,
    },
    ConnectorCompleted {
        connector: String,
        candidate_count: usize,
        at: DateTime<Utc>,
    },
    ConnectorFailed {
        connector: String,
        kind: String,
        message: String,
        at: DateTime<Utc>,
    },
    ConnectorCancelled {
        connector: String,
        at: DateTime<Utc>,
    },
    RuleFailed {
        rule_id: String,
        source: String,
        cause: String,
    },
    EarlyStop {
        reason: EarlyStopReason,
        at: DateTime<Utc>,
    },
    RunCancelled {
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    BudgetGated,
    NoTriggerMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyStopReason {
    BudgetExhausted,
    HighConfidenceMatch,
    WallClockDeadline,
}

/// One entry in `ExecutionContext.errors` (spec section 3). Distinct from
/// `RunEvent::ConnectorFailed` in that it is the durable, reportable
/// record; `RunEvent`s are the full narration stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub source: String,
    pub kind: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(source: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: kind.into(),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}
