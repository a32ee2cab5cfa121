//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rsforest/rsforest.toml`
//! 3. Local config: `.rsforest.toml` in the directory of the record file
//! 4. Environment variables: `RSFOREST_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Unified configuration for rsforest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Label of the synthetic node that groups several roots when rendering
    pub root_label: String,
    /// Show order numbers next to node labels
    pub show_order: bool,
    /// Fail on parent ids that match no record instead of treating the node as a root
    pub strict_parents: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_label: ".".into(),
            show_order: false,
            strict_parents: false,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub root_label: Option<String>,
    pub show_order: Option<bool>,
    pub strict_parents: Option<bool>,
}

/// Get the XDG config directory for rsforest.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rsforest").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rsforest.toml"))
}

/// Get the path to the local config file next to record files in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".rsforest.toml")
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

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            root_label: overlay
                .root_label
                .clone()
                .unwrap_or_else(|| self.root_label.clone()),
            show_order: overlay.show_order.unwrap_or(self.show_order),
            strict_parents: overlay.strict_parents.unwrap_or(self.strict_parents),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.rsforest.toml`, usually
    ///   the directory of the record file being processed
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply RSFOREST_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("RSFOREST")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("root_label") {
            settings.root_label = val;
        }
        if let Ok(val) = config.get_bool("show_order") {
            settings.show_order = val;
        }
        if let Ok(val) = config.get_bool("strict_parents") {
            settings.strict_parents = val;
        }

        Ok(settings)
    }

    /// Load ONLY global config (defaults + XDG config file).
    pub fn load_global_only() -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("root_label", defaults.root_label)
            .map_err(config_err)?
            .set_default("show_order", defaults.show_order)
            .map_err(config_err)?
            .set_default("strict_parents", defaults.strict_parents)
            .map_err(config_err)?;

        if let Some(global_path) = global_config_path() {
            builder = builder.add_source(File::from(global_path).required(false));
        }

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# rsforest configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/rsforest/rsforest.toml
#   Local:  .rsforest.toml next to the record file
#   Env:    RSFOREST_* environment variables

# Label of the node grouping several roots in tree output
# root_label = "."

# Print order numbers next to node labels
# show_order = false

# Fail on parent ids that match no record
# strict_parents = false
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
    fn given_default_settings_then_lenient_and_plain() {
        let settings = Settings::default();
        assert_eq!(settings.root_label, ".");
        assert!(!settings.show_order);
        assert!(!settings.strict_parents);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_specified_fields_change() {
        let base = Settings::default();
        let overlay = RawSettings {
            show_order: Some(true),
            ..Default::default()
        };

        let merged = base.merge_with(&overlay);

        assert!(merged.show_order);
        assert_eq!(merged.root_label, base.root_label);
        assert_eq!(merged.strict_parents, base.strict_parents);
    }

    #[test]
    fn given_template_when_parsed_then_yields_no_overrides() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.root_label.is_none());
        assert!(raw.show_order.is_none());
        assert!(raw.strict_parents.is_none());
    }

    #[test]
    fn given_settings_when_serialized_then_roundtrips_through_raw() {
        let settings = Settings {
            root_label: "forest".into(),
            show_order: true,
            strict_parents: true,
        };
        let raw: RawSettings = toml::from_str(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(Settings::default().merge_with(&raw), settings);
    }
}
