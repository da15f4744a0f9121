//! Persistence layer for raw ingestions, per-record extractions, final
//! entities, and failed extractions (spec section 6). `Store` is the
//! seam: `PostgresStore` backs production runs, `FakeStore` backs
//! orchestrator/CLI tests without a live database.

pub mod error;
pub mod model;
pub mod postgres;
pub mod repository;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{Result, StoreError};
pub use model::{FailedExtractionInput, RawIngestionInput, StoredRawIngestion};
pub use postgres::PostgresStore;
pub use repository::Store;
