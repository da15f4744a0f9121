use std::env;

/// Process-wide configuration loaded once from the environment at
/// bootstrap (spec section 6). Required keys panic with a named-variable
/// message; optional keys fall back to documented defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Lens id, used only as the lowest-precedence fallback in
    /// `scout-cli`'s lens resolution (CLI flag > env > config file > this).
    pub lens_id: Option<String>,
    /// Structured-extract backend credential (or equivalent).
    pub anthropic_api_key: Option<String>,
    /// Postgres connection string for `scout-store`.
    pub database_url: String,
    /// `tracing` filter directive, e.g. "info" or "scout_orchestrator=debug".
    pub log_level: String,
    /// When true, legacy Phase-A field-name patterns are hard errors
    /// instead of warnings (spec section 4.5).
    pub strict_field_validation: bool,
    /// Default in-flight-per-phase worker count (spec section 4.4).
    pub max_in_flight_per_phase: usize,
}

impl Config {
    /// Load configuration from environment variables. Panics if
    /// `DATABASE_URL` is unset — every run needs somewhere to persist to,
    /// even a dry run that ultimately skips the upsert.
    pub fn from_env() -> Self {
        Self {
            lens_id: env::var("LENS_ID").ok(),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            database_url: required_env("DATABASE_URL"),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            strict_field_validation: env::var("STRICT_FIELD_VALIDATION")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            max_in_flight_per_phase: env::var("MAX_IN_FLIGHT_PER_PHASE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
        }
    }
}

fn required_env(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("missing required environment variable: {name}"))
}
