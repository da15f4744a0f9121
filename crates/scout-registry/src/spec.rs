use std::time::Duration;

use scout_common::{Phase, TrustTier};
use serde::{Deserialize, Serialize};

/// Per-minute / per-hour call caps honoured by the adapter's token-bucket
/// rate limiter (spec section 4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub per_minute: u32,
    pub per_hour: u32,
}

/// Immutable description of one external data source, registered once at
/// bootstrap (spec section 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub name: String,
    pub phase: Phase,
    pub cost_per_call_usd: f64,
    pub trust_tier: TrustTier,
    /// Lower wins when the planner orders connectors within a phase.
    pub default_priority: i32,
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    pub rate_limit: RateLimit,
}

impl ConnectorSpec {
    pub fn is_free(&self) -> bool {
        self.cost_per_call_usd <= 0.0
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_millis().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
