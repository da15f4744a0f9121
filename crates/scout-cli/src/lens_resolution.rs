//! Lens precedence resolution (spec section 6): `CLI flag > env LENS_ID >
//! config/app.yaml:default_lens > hardcoded fallback`. Kept as a pure
//! function over already-read inputs so the precedence order is
//! unit-testable without touching real environment variables or disk.

/// Fallback lens id used when none of the higher-precedence sources name
/// one. Kept as a named constant rather than inlined so a future second
/// fallback vertical only changes one line.
pub const HARDCODED_FALLBACK_LENS_ID: &str = "default";

pub fn resolve_lens_id(cli_flag: Option<&str>, env_lens_id: Option<&str>, config_default_lens: Option<&str>) -> String {
    cli_flag
        .or(env_lens_id)
        .or(config_default_lens)
        .unwrap_or(HARDCODED_FALLBACK_LENS_ID)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_wins_over_everything() {
        let resolved = resolve_lens_id(Some("padel-v1"), Some("env-lens"), Some("config-lens"));
        assert_eq!(resolved, "padel-v1");
    }

    #[test]
    fn env_wins_over_config_when_no_cli_flag() {
        let resolved = resolve_lens_id(None, Some("env-lens"), Some("config-lens"));
        assert_eq!(resolved, "env-lens");
    }

    #[test]
    fn config_wins_over_hardcoded_fallback() {
        let resolved = resolve_lens_id(None, None, Some("config-lens"));
        assert_eq!(resolved, "config-lens");
    }

    #[test]
    fn hardcoded_fallback_is_last_resort() {
        let resolved = resolve_lens_id(None, None, None);
        assert_eq!(resolved, HARDCODED_FALLBACK_LENS_ID);
    }
}
