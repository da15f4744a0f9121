use thiserror::Error;

/// Source-severity failure kinds (spec sections 4.1, 7). Only `Auth`,
/// `NotFound`, and `Malformed` are fatal-to-connector; `Transient` is
/// retried by the adapter before it ever reaches the caller; the rest are
/// recorded into `ctx.errors` and never abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorKind {
    Timeout,
    RateLimited,
    Transient,
    Auth,
    NotFound,
    Malformed,
}

impl SourceErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceErrorKind::Timeout => "timeout",
            SourceErrorKind::RateLimited => "rate_limited",
            SourceErrorKind::Transient => "transient",
            SourceErrorKind::Auth => "auth",
            SourceErrorKind::NotFound => "not_found",
            SourceErrorKind::Malformed => "malformed",
        }
    }

    /// Whether the adapter should retry this kind with backoff before
    /// surfacing it.
    pub fn is_retryable(self) -> bool {
        matches!(self, SourceErrorKind::Transient)
    }
}

#[derive(Debug, Error)]
#[error("{kind}: {cause}", kind = kind.as_str())]
pub struct SourceError {
    pub kind: SourceErrorKind,
    pub cause: String,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }

    pub fn timeout(cause: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Timeout, cause)
    }

    pub fn rate_limited(cause: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, cause)
    }

    pub fn transient(cause: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Transient, cause)
    }
}
