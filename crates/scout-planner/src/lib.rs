//! Planner (spec section 4.3). Turns a query and a validated lens into a
//! deterministic, budget-gated execution plan. Never touches the network
//! or the lens's raw YAML — only the parsed contract and the registry.

pub mod feature;
pub mod plan;
pub mod request;

pub use feature::{extract_features, QueryFeatures};
pub use plan::{plan, ConnectorInvocation};
pub use request::PlanRequest;
