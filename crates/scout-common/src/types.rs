//! Structural types shared across every crate in the workspace. None of
//! these carry vertical-specific *values* — only the fixed shape the spec
//! defines (phases, trust tiers, dimension names, primitive field names).

use serde::{Deserialize, Serialize};

/// Orchestration mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    ResolveOne,
    DiscoverMany,
}

/// The phase a connector runs in. Discovery connectors run before
/// enrichment connectors; the orchestrator enforces a phase barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Enrichment,
}

impl Phase {
    pub const ORDER: [Phase; 2] = [Phase::Discovery, Phase::Enrichment];
}

/// Coarse ordinal trust ranking on a connector. The *sole* basis for
/// field-level merge precedence — never branch on connector name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    Low,
    Medium,
    High,
}

impl TrustTier {
    /// Ordinal rank used for tie-break comparisons: higher is better.
    pub fn rank(self) -> u8 {
        match self {
            TrustTier::Low => 0,
            TrustTier::Medium => 1,
            TrustTier::High => 2,
        }
    }
}

/// Structural class of an extracted/final entity. Inferred from shape, not
/// from lens vocabulary (spec 4.5, Phase A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Place,
    Person,
    Organization,
    Event,
    Thing,
}

impl std::str::FromStr for EntityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "place" => Ok(EntityClass::Place),
            "person" => Ok(EntityClass::Person),
            "organization" => Ok(EntityClass::Organization),
            "event" => Ok(EntityClass::Event),
            "thing" => Ok(EntityClass::Thing),
            other => Err(format!("unknown entity class: {other}")),
        }
    }
}

impl std::fmt::Display for EntityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityClass::Place => "place",
            EntityClass::Person => "person",
            EntityClass::Organization => "organization",
            EntityClass::Event => "event",
            EntityClass::Thing => "thing",
        };
        write!(f, "{s}")
    }
}

/// The four fixed, multi-valued canonical dimensions (spec GLOSSARY). The
/// *name* of each dimension is structural; the *values* placed into it
/// live only in the lens's `canonical_values` registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CanonicalActivities,
    CanonicalRoles,
    CanonicalPlaceTypes,
    CanonicalAccess,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::CanonicalActivities,
        Dimension::CanonicalRoles,
        Dimension::CanonicalPlaceTypes,
        Dimension::CanonicalAccess,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::CanonicalActivities => "canonical_activities",
            Dimension::CanonicalRoles => "canonical_roles",
            Dimension::CanonicalPlaceTypes => "canonical_place_types",
            Dimension::CanonicalAccess => "canonical_access",
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canonical_activities" => Ok(Dimension::CanonicalActivities),
            "canonical_roles" => Ok(Dimension::CanonicalRoles),
            "canonical_place_types" => Ok(Dimension::CanonicalPlaceTypes),
            "canonical_access" => Ok(Dimension::CanonicalAccess),
            other => Err(format!("unknown dimension: {other}")),
        }
    }
}

/// The exact schema primitive field names a Phase-A extractor may emit
/// (spec 4.5). Kept as an enum so typos in lens/rule definitions that
/// reference a primitive fail to compile/validate rather than silently
/// mapping nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveField {
    EntityName,
    Latitude,
    Longitude,
    StreetAddress,
    City,
    Postcode,
    Country,
    Phone,
    Email,
    WebsiteUrl,
}

impl std::str::FromStr for PrimitiveField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entity_name" => Ok(Self::EntityName),
            "latitude" => Ok(Self::Latitude),
            "longitude" => Ok(Self::Longitude),
            "street_address" => Ok(Self::StreetAddress),
            "city" => Ok(Self::City),
            "postcode" => Ok(Self::Postcode),
            "country" => Ok(Self::Country),
            "phone" => Ok(Self::Phone),
            "email" => Ok(Self::Email),
            "website_url" => Ok(Self::WebsiteUrl),
            other => Err(format!("unknown primitive field: {other}")),
        }
    }
}
