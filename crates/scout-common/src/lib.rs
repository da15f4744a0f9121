pub mod config;
pub mod error;
pub mod geo;
pub mod quality;
pub mod types;

pub use config::Config;
pub use error::ScoutError;
pub use geo::{haversine_distance_meters, GeoPoint};
pub use types::{Dimension, EntityClass, Mode, Phase, PrimitiveField, TrustTier};

/// Normalize a name into a URL-safe slug: lowercase, strip non-alphanumerics
/// (keeping spaces), collapse whitespace to single hyphens.
///
/// ```
/// assert_eq!(scout_common::slugify("Powerleague Portobello"), "powerleague-portobello");
/// assert_eq!(scout_common::slugify("Lake St. Church!!!"), "lake-st-church");
/// assert_eq!(scout_common::slugify("  Multiple   Spaces  "), "multiple-spaces");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<&str>>().join("-")
}
