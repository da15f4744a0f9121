use scout_common::Mode;

/// The caller's request (spec section 3). `lens_id` is resolved by
/// `scout-cli`'s precedence chain before this ever reaches the
/// orchestrator — by the time a `Request` exists, the lens to load is
/// already decided.
#[derive(Debug, Clone)]
pub struct Request {
    pub query: String,
    pub mode: Mode,
    pub budget_usd: Option<f64>,
    pub lens_id: Option<String>,
    pub persist: bool,
}

impl Request {
    pub fn new(query: impl Into<String>, mode: Mode) -> Self {
        Self {
            query: query.into(),
            mode,
            budget_usd: None,
            lens_id: None,
            persist: false,
        }
    }
}
