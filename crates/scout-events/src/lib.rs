//! Structured event vocabulary narrating a single run, plus the
//! append-only log that backs `ExecutionContext::errors` (spec section 5:
//! "errors is append-only under a single lock").
//!
//! Domain-agnostic: nothing here references a lens's vocabulary, a
//! connector's business logic, or any canonical value. It only describes
//! the *shape* of a run (which phase, which connector, which rule) the
//! way `rootsignal-events` describes the shape of a fact stream without
//! knowing what the facts mean.

pub mod store;
pub mod types;

pub use store::{ErrorLog, EventLog};
pub use types::{DropReason, EarlyStopReason, ErrorRecord, RunEvent};
