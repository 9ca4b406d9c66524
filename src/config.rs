//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/protoclone/protoclone.toml`
//! 3. Local config: file given with `--config`
//! 4. Environment variables: `PROTOCLONE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::CloneDepth;

/// Unified configuration for protoclone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Depth used by `clone` when `--depth` is not given
    pub depth: CloneDepth,
    /// Graph fixture used when `--fixture` is not given (default: built-in scenario)
    pub fixture: Option<PathBuf>,
    /// Print graph trees alongside results
    pub show_tree: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            depth: CloneDepth::Deep,
            fixture: None,
            show_tree: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub depth: Option<CloneDepth>,
    pub fixture: Option<PathBuf>,
    pub show_tree: Option<bool>,
}

/// Get the XDG config directory for protoclone.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "protoclone").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("protoclone.toml"))
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

/// Expand `~`, `$VAR` and `${VAR}` in a path; leaves it untouched on failure.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    fn expand_paths(&mut self) {
        self.fixture = self.fixture.as_deref().map(expand_path);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            depth: overlay.depth.unwrap_or(self.depth),
            fixture: overlay.fixture.clone().or_else(|| self.fixture.clone()),
            show_tree: overlay.show_tree.unwrap_or(self.show_tree),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file passed on the command line; it must exist
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), local)
    }

    /// Load with an explicit global config location (missing global file is fine).
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global {
            if global_path.exists() {
                let raw = load_raw_settings(global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(local_path) = local {
            let raw = load_raw_settings(local_path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply PROTOCLONE_* environment variables as explicit overrides.
    ///
    /// A variable that is set but cannot be parsed is an error.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PROTOCLONE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = optional(config.get_string("depth"))? {
            settings.depth = val.parse().map_err(|message| ApplicationError::Config {
                message: format!("PROTOCLONE_DEPTH: {message}"),
            })?;
        }
        if let Some(val) = optional(config.get_string("fixture"))? {
            settings.fixture = Some(PathBuf::from(val));
        }
        if let Some(val) = optional(config.get_bool("show_tree"))? {
            settings.show_tree = val;
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
        r#"# protoclone configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/protoclone/protoclone.toml
#   Local:  file passed with --config
#   Env:    PROTOCLONE_* environment variables (e.g. PROTOCLONE_DEPTH=shallow)

# Clone depth used by `protoclone clone` without --depth: "shallow" or "deep"
# depth = "deep"

# Graph fixture used when --fixture is not given (built-in scenario if unset)
# fixture = "~/fixtures/scenario.toml"

# Print graph trees next to results
# show_tree = true
"#
        .to_string()
    }
}

/// Unset keys are `None`; values of the wrong type are errors.
fn optional<T>(result: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
