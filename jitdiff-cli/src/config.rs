//! Optional `--config <path>` TOML layer over `GenConfig`'s defaults,
//! loaded at runtime with `toml` + `serde`: a config file only needs to
//! name the fields it overrides since `GenConfig` derives
//! `#[serde(default)]`.

use jitdiff_core::GenConfig;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

pub fn load(path: Option<&Path>) -> Result<GenConfig, ConfigError> {
    let Some(path) = path else { return Ok(GenConfig::default()) };
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_path_yields_defaults() {
        let cfg = load(None).unwrap();
        assert_eq!(cfg, GenConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jitdiff.toml");
        std::fs::write(&path, "num_aggregates = 12\n").unwrap();
        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.num_aggregates, 12);
        assert_eq!(cfg.num_interfaces, GenConfig::default().num_interfaces);
    }
}
