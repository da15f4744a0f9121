//! `config/app.yaml`: the lowest-precedence lens source in lens resolution
//! (spec section 6). Unlike `scout_common::Config::from_env`'s required
//! keys, this file is entirely optional — a fresh checkout with no config
//! file at all still runs, it just has no `default_lens` to fall back to.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppFileConfig {
    pub default_lens: Option<String>,
}

/// Reads `path` if it exists; a missing file is not an error (spec
/// section 6 doesn't require one), but a present-and-malformed file is.
pub fn load(path: &Path) -> anyhow::Result<AppFileConfig> {
    if !path.exists() {
        return Ok(AppFileConfig::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("could not read {}: {e}", path.display()))?;
    let config: AppFileConfig = serde_yaml::from_str(&raw).map_err(|e| anyhow::anyhow!("malformed {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default_config() {
        let config = load(Path::new("/nonexistent/scout-cli-test/app.yaml")).unwrap();
        assert_eq!(config.default_lens, None);
    }

    #[test]
    fn reads_default_lens_from_yaml() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("scout-cli-app-config-test-{}.yaml", std::process::id()));
        std::fs::write(&path, "default_lens: padel-v1\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.default_lens.as_deref(), Some("padel-v1"));

        std::fs::remove_file(&path).ok();
    }
}
