use thiserror::Error;

/// Crate-wide error type for configuration- and persistence-severity
/// failures. Source-, extraction-rule-, and LLM-severity failures are
/// recorded into the execution context rather than propagated as this
/// type — see spec section 7's error taxonomy.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("lens validation error [{code}]: {details}")]
    LensValidation { code: String, details: String },

    #[error("unknown connector: {0}")]
    UnknownConnector(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("run was cancelled")]
    Cancelled,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
