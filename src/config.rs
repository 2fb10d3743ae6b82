//! `gh-aw.toml` layered configuration: compiler defaults, merged with an
//! optional user config under `~/.config/gh-aw/config.toml` and an optional
//! workspace `gh-aw.toml`, later layers winning field-by-field.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GhAwConfig {
    pub runs_on: String,
    pub default_engine: String,
    pub strict_by_default: bool,
    pub bundled_ecosystems: Vec<String>,
    pub log_level: String,
}

impl Default for GhAwConfig {
    fn default() -> Self {
        Self {
            runs_on: "ubuntu-latest".to_string(),
            default_engine: "claude".to_string(),
            strict_by_default: false,
            bundled_ecosystems: vec!["defaults".to_string(), "github".to_string()],
            log_level: "info".to_string(),
        }
    }
}

/// Recursively merge two TOML values: tables merge key-by-key, anything
/// else is replaced wholesale by `overlay`.
fn merge_toml_values(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key.clone(), value.clone());
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

fn load_layer(path: &Path) -> Result<Option<toml::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
    let value: toml::Value = toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))?;
    Ok(Some(value))
}

/// Load defaults, then `~/.config/gh-aw/config.toml`, then the workspace's
/// own `gh-aw.toml` (or `explicit_path` if given), deep-merging each layer
/// present over the last.
pub fn load(workspace_root: &Path, explicit_path: Option<&Path>) -> Result<GhAwConfig> {
    let mut merged = toml::Value::try_from(GhAwConfig::default())?;

    let user_config_path = dirs::config_dir().map(|dir| dir.join("gh-aw").join("config.toml"));
    if let Some(path) = user_config_path {
        if let Some(layer) = load_layer(&path)? {
            merge_toml_values(&mut merged, &layer);
        }
    }

    let workspace_path: PathBuf = explicit_path.map(PathBuf::from).unwrap_or_else(|| workspace_root.join("gh-aw.toml"));
    if let Some(layer) = load_layer(&workspace_path)? {
        merge_toml_values(&mut merged, &layer);
    }

    merged.try_into().context("deserializing merged gh-aw configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn falls_back_to_defaults_when_no_files_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path(), None).unwrap();
        assert_eq!(config.runs_on, "ubuntu-latest");
    }

    #[test]
    fn workspace_layer_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gh-aw.toml"), "runs-on = \"macos-latest\"\nstrict-by-default = true\n").unwrap();
        let config = load(dir.path(), None).unwrap();
        assert_eq!(config.runs_on, "macos-latest");
        assert!(config.strict_by_default);
    }
}
