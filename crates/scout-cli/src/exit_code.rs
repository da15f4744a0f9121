//! Exit code mapping (spec section 6). Kept as a pure function over a
//! small outcome enum so `main` stays a thin dispatcher.

use scout_orchestrator::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    InvalidInput,
    LensValidation,
    AllConnectorsFailed,
    PersistenceError,
    Cancelled,
}

impl ExitOutcome {
    pub fn code(self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::InvalidInput => 2,
            ExitOutcome::LensValidation => 3,
            ExitOutcome::AllConnectorsFailed => 4,
            ExitOutcome::PersistenceError => 5,
            // Scenario F (spec section 8) maps a user cancellation onto
            // the same code as invalid input rather than minting a new one.
            ExitOutcome::Cancelled => 2,
        }
    }
}

/// Classifies a completed report. Cancellation is detected upstream (the
/// orchestrator ran to a `RunCancelled` event) before this is reached.
pub fn classify_report(report: &Report, requested_persist: bool) -> ExitOutcome {
    if report.all_connectors_failed() {
        return ExitOutcome::AllConnectorsFailed;
    }
    if requested_persist && !report.persisted && !report.entities.is_empty() {
        return ExitOutcome::PersistenceError;
    }
    ExitOutcome::Success
}
