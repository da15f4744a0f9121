use std::collections::BTreeSet;

use scout_lens::Vocabulary;

/// Features extracted from the raw query using only `lens.vocabulary`
/// (spec section 4.3). The planner and the connector triggers never look
/// at the query string again after this step.
#[derive(Debug, Clone, Default)]
pub struct QueryFeatures {
    /// Category/activity vocabulary terms found in the query, lowercased.
    pub keywords: BTreeSet<String>,
    /// Gazetteer location terms found in the query, lowercased.
    pub locations: BTreeSet<String>,
    /// True when the query contains a capitalised token that isn't itself
    /// a known category or location term — a proper-noun-like signal that
    /// the caller named a specific entity rather than a category.
    pub looks_like_specific_entity: bool,
}

pub fn extract_features(query: &str, vocabulary: &Vocabulary) -> QueryFeatures {
    let lower = query.to_lowercase();

    let keywords = vocabulary
        .category_terms
        .iter()
        .filter(|term| lower.contains(term.to_lowercase().as_str()))
        .map(|term| term.to_lowercase())
        .collect();

    let locations = vocabulary
        .location_terms
        .iter()
        .filter(|term| lower.contains(term.to_lowercase().as_str()))
        .map(|term| term.to_lowercase())
        .collect();

    let known_terms: BTreeSet<String> = vocabulary
        .category_terms
        .iter()
        .chain(vocabulary.location_terms.iter())
        .map(|t| t.to_lowercase())
        .collect();

    let looks_like_specific_entity = query.split_whitespace().any(|token| {
        let starts_uppercase = token.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
        starts_uppercase && !known_terms.contains(&token.to_lowercase())
    });

    QueryFeatures {
        keywords,
        locations,
        looks_like_specific_entity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary {
            category_terms: vec!["padel".to_string(), "courts".to_string()],
            location_terms: vec!["edinburgh".to_string()],
        }
    }

    #[test]
    fn category_query_has_no_specific_entity_signal() {
        let features = extract_features("padel courts edinburgh", &vocab());
        assert!(features.keywords.contains("padel"));
        assert!(features.locations.contains("edinburgh"));
        assert!(!features.looks_like_specific_entity);
    }

    #[test]
    fn named_entity_query_is_detected() {
        let features = extract_features("Powerleague Portobello", &vocab());
        assert!(features.looks_like_specific_entity);
    }

    #[test]
    fn known_vocabulary_terms_do_not_count_as_proper_nouns() {
        // "Edinburgh" capitalised but it's a known location term — should not
        // by itself flag the query as a specific entity.
        let features = extract_features("padel courts Edinburgh", &vocab());
        assert!(!features.looks_like_specific_entity);
    }
}
