use scout_common::Mode;

/// The slice of a caller's request the planner actually needs. The full
/// `Request` (carrying `lens_id` and `persist`, spec section 3) lives in
/// `scout-orchestrator`, which depends on this crate — not the other way
/// around — so the orchestrator builds one of these at the boundary.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub query: String,
    pub mode: Mode,
    pub budget_usd: Option<f64>,
}
