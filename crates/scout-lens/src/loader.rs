use std::path::Path;

use scout_registry::ConnectorRegistry;

use crate::contract::LensContract;
use crate::error::LensValidationError;
use crate::validate;

/// Loads and validates the lens contract at `path` (a YAML document, spec
/// section 6). Structural schema errors (gate 1) surface as a
/// `serde_yaml` deserialization failure wrapped in the same error type as
/// the semantic gates in [`validate::validate`], so callers never need to
/// distinguish "malformed document" from "malformed contract".
pub fn load(path: &Path, registry: &ConnectorRegistry) -> Result<LensContract, LensValidationError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| LensValidationError::new("read_failed", format!("could not read {}: {e}", path.display())))?;

    let lens = parse(&raw)?;
    validate::validate(&lens, registry)?;
    Ok(lens)
}

/// Gate 1 (structural schema): parses a YAML document into a `LensContract`
/// without touching disk, so tests can exercise malformed-document cases
/// without a fixture file.
pub fn parse(raw: &str) -> Result<LensContract, LensValidationError> {
    serde_yaml::from_str(raw).map_err(|e| LensValidationError::new("structural_schema", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{test_registry, valid_lens};

    #[test]
    fn round_trips_through_yaml() {
        let lens = valid_lens();
        let yaml = serde_yaml::to_string(&lens).unwrap();
        let parsed = parse(&yaml).unwrap();
        assert_eq!(parsed.lens_id, lens.lens_id);
        assert_eq!(parsed.mapping_rules.len(), lens.mapping_rules.len());
    }

    #[test]
    fn malformed_yaml_fails_gate_one() {
        let err = parse("lens_id: [this, is, not, a, contract]").unwrap_err();
        assert_eq!(err.code, "structural_schema");
    }

    #[test]
    fn load_validates_after_parsing() {
        let lens = valid_lens();
        let yaml = serde_yaml::to_string(&lens).unwrap();
        let dir = std::env::temp_dir();
        let path = dir.join(format!("scout-lens-test-{}.yaml", std::process::id()));
        std::fs::write(&path, yaml).unwrap();

        let registry = test_registry();
        let loaded = load(&path, &registry).unwrap();
        assert_eq!(loaded.lens_id, lens.lens_id);

        std::fs::remove_file(&path).ok();
    }
}
