use sha2::{Digest, Sha256};

const MAX_SLUG_LEN: usize = 100;

/// Builds the final entity slug: normalised name, an optional locality
/// token, and a 4-char stable hash of the raw name+locality, truncated so
/// the total never exceeds 100 characters (spec section 4.6).
pub fn generate_slug(entity_name: &str, locality: Option<&str>) -> String {
    let name_slug = scout_common::slugify(entity_name);
    let locality_slug = locality.map(|l| scout_common::slugify(l)).filter(|s| !s.is_empty());

    let raw_key = match locality {
        Some(l) => format!("{entity_name}|{l}"),
        None => entity_name.to_string(),
    };
    let digest = Sha256::digest(raw_key.as_bytes());
    let hash_token = hex::encode(&digest[..2]);

    let mut parts = vec![name_slug];
    if let Some(locality_slug) = locality_slug {
        parts.push(locality_slug);
    }
    parts.push(hash_token);

    let slug = parts.join("-");
    if slug.len() <= MAX_SLUG_LEN {
        slug
    } else {
        let hash_suffix = parts.last().cloned().unwrap_or_default();
        let budget = MAX_SLUG_LEN.saturating_sub(hash_suffix.len() + 1);
        let truncated: String = slug.chars().take(budget).collect();
        format!("{}-{}", truncated.trim_end_matches('-'), hash_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_includes_name_locality_and_hash() {
        let slug = generate_slug("Powerleague Portobello", Some("Edinburgh"));
        assert!(slug.starts_with("powerleague-portobello-edinburgh-"));
        assert!(slug.len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn slug_is_stable_for_identical_inputs() {
        let a = generate_slug("Powerleague Portobello", Some("Edinburgh"));
        let b = generate_slug("Powerleague Portobello", Some("Edinburgh"));
        assert_eq!(a, b);
    }

    #[test]
    fn slug_differs_when_locality_differs() {
        let a = generate_slug("Powerleague Portobello", Some("Edinburgh"));
        let b = generate_slug("Powerleague Portobello", Some("Glasgow"));
        assert_ne!(a, b);
    }

    #[test]
    fn slug_without_locality_omits_that_segment() {
        let slug = generate_slug("Powerleague Portobello", None);
        assert_eq!(slug.matches('-').count(), 2);
    }

    #[test]
    fn long_names_are_truncated_to_the_length_budget() {
        let long_name = "A".repeat(200);
        let slug = generate_slug(&long_name, Some("Edinburgh"));
        assert!(slug.len() <= MAX_SLUG_LEN);
    }
}
