use thiserror::Error;

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence-severity failures (spec section 7). A unique-slug conflict
/// on `entities` is never surfaced as this type — it is an upsert.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(String),
}
