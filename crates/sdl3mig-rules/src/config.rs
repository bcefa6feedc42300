//! Configuration file support
//!
//! Loads `.sdl3mig.toml` from a directory or its parents.
//!
//! ```toml
//! [rules]
//! disabled = ["audio_stream_split"]
//!
//! [areas]
//! disabled = ["haptic"]
//!
//! [conditions]
//! namespace = "^(SDL|IMG|TTF)_[A-Z]"
//!
//! [includes]
//! aliases = { "sdl_compat.h" = "SDL3/SDL.h" }
//!
//! [tables]
//! extra = ["migration/net.yaml"]
//! ```

use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::DEFAULT_NAMESPACE;
use crate::loader::LoadError;

pub const CONFIG_FILE_NAME: &str = ".sdl3mig.toml";

/// Errors that can occur while loading a configuration or building an
/// engine from it
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid condition namespace: {0}")]
    Namespace(#[from] regex::Error),

    #[error("Failed to load tables: {0}")]
    Tables(#[from] LoadError),
}

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub rules: RulesConfig,
    pub areas: AreasConfig,
    pub conditions: ConditionsConfig,
    pub includes: IncludesConfig,
    pub tables: TablesConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// If set, only these rules will run
    pub enabled: Option<Vec<String>>,
    /// Rules to exclude (applied after enabled)
    pub disabled: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AreasConfig {
    /// If set, only tables of these areas are loaded
    pub enabled: Option<Vec<String>>,
    pub disabled: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConditionsConfig {
    /// Regex a callee must match for its error checks to be rewritten
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IncludesConfig {
    pub enabled: bool,
    /// Extra exact header aliases, consulted before the built-in ones
    pub aliases: BTreeMap<String, String>,
}

impl Default for IncludesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            aliases: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Area table files or directories loaded after the built-in tables.
    /// Relative paths are resolved against the config file's directory.
    pub extra: Vec<PathBuf>,
}

impl MigrationConfig {
    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: &Path) -> Result<Option<(MigrationConfig, PathBuf)>, ConfigError> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<MigrationConfig, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: MigrationConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            for extra in &mut config.tables.extra {
                if extra.is_relative() {
                    *extra = base.join(&*extra);
                }
            }
        }

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Compute the effective set of enabled rules
    pub fn effective_rules(&self, all_rules: &[&str]) -> HashSet<String> {
        let mut rules: HashSet<String> = match &self.rules.enabled {
            Some(enabled) => enabled.iter().cloned().collect(),
            None => all_rules.iter().map(|s| s.to_string()).collect(),
        };

        for disabled in &self.rules.disabled {
            rules.remove(disabled);
        }

        rules
    }

    pub fn area_enabled(&self, area: &str) -> bool {
        let enabled = match &self.areas.enabled {
            Some(enabled) => enabled.iter().any(|a| a == area),
            None => true,
        };
        enabled && !self.areas.disabled.iter().any(|a| a == area)
    }

    /// The compiled condition namespace, falling back to `^SDL_[A-Z]`
    pub fn namespace_pattern(&self) -> Result<Regex, ConfigError> {
        let pattern = self.conditions.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        Ok(Regex::new(pattern)?)
    }
}
