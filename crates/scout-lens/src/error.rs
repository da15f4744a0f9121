use thiserror::Error;

/// A lens validation failure. Fatal at bootstrap (spec sections 4.2, 7) —
/// the first failing gate aborts the load; there is no silent fallback.
#[derive(Debug, Error)]
#[error("lens validation failed [{code}]: {details}")]
pub struct LensValidationError {
    pub code: String,
    pub details: String,
}

impl LensValidationError {
    pub fn new(code: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            details: details.into(),
        }
    }
}
