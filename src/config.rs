//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/ordtree/ordtree.toml`
//! 3. Local config: `<project_dir>/.ordtree.toml`
//! 4. Environment variables: `ORDTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::DeletePolicy;

/// Raw settings for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub delete_policy: Option<DeletePolicy>,
    pub renumber_on_reorder: Option<bool>,
}

/// Unified configuration for ordtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON data file holding nodes, collections and items
    pub data_file: PathBuf,
    /// What deleting a node with children does
    pub delete_policy: DeletePolicy,
    /// Whether a collection reorder also relabels numbers 1..=n
    pub renumber_on_reorder: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            delete_policy: DeletePolicy::default(),
            renumber_on_reorder: true,
        }
    }
}

/// Default data file: `<XDG data dir>/ordtree/ordtree.json`.
fn default_data_file() -> PathBuf {
    ProjectDirs::from("", "", "ordtree")
        .map(|dirs| dirs.data_dir().join("ordtree.json"))
        .unwrap_or_else(|| PathBuf::from("~/.ordtree/ordtree.json"))
}

/// Get the XDG config directory for ordtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ordtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("ordtree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".ordtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the path as is.
pub(crate) fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Merge overlay config onto self: overlay wins where it says something.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            delete_policy: overlay.delete_policy.unwrap_or(self.delete_policy),
            renumber_on_reorder: overlay
                .renumber_on_reorder
                .unwrap_or(self.renumber_on_reorder),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.ordtree.toml`
    ///
    /// A relative `data_file` from the local config is resolved against
    /// `project_dir`.
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let mut raw = load_raw_settings(&local_path)?;
                raw.data_file = raw.data_file.map(|p| {
                    let p = expand_path(&p);
                    if p.is_relative() {
                        dir.join(p)
                    } else {
                        p
                    }
                });
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.data_file = expand_path(&current.data_file);
        Ok(current)
    }

    /// Apply ORDTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("ORDTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("delete_policy") {
            settings.delete_policy = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_bool("renumber_on_reorder") {
            settings.renumber_on_reorder = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# ordtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/ordtree/ordtree.toml
#   Local:  <project_dir>/.ordtree.toml
#   Env:    ORDTREE_* environment variables (e.g. ORDTREE_DATA_FILE)

# JSON data file with nodes, collections and items
# data_file = "~/.local/share/ordtree/ordtree.json"

# Deleting a node that has children: "reject" or "cascade"
# delete_policy = "reject"

# Relabel item numbers 1..n whenever a collection is reordered
# renumber_on_reorder = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_overlay_values_when_merging_then_keeps_base() {
        let base = Settings::default();
        let merged = base.merge_with(&RawSettings::default());
        assert_eq!(merged, base);
    }

    #[test]
    fn given_overlay_values_when_merging_then_overlay_wins() {
        let base = Settings::default();
        let merged = base.merge_with(&RawSettings {
            data_file: Some(PathBuf::from("/tmp/x.json")),
            delete_policy: Some(DeletePolicy::Cascade),
            renumber_on_reorder: Some(false),
        });
        assert_eq!(merged.data_file, PathBuf::from("/tmp/x.json"));
        assert_eq!(merged.delete_policy, DeletePolicy::Cascade);
        assert!(!merged.renumber_on_reorder);
    }

    #[test]
    fn given_tilde_in_path_when_expanding_then_uses_home() {
        let home = std::env::var("HOME").expect("HOME should be set");
        let expanded = expand_path(Path::new("~/data/ordtree.json"));
        assert!(expanded.starts_with(&home));
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("parse template");
        assert!(raw.data_file.is_none());
    }
}
