// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::engine::ThreadPoolArgs;
use crate::errors::{ConfigError, ConfigLoadError};

/// Engine-wide execution layout.
///
/// Describes the default thread pool and any named affinity zones, each of
/// which becomes a dedicated pool that blocks can be bound to by name.
///
/// # Fields
/// * `default_pool` - Layout used for the unnamed (empty) zone
/// * `affinity_zones` - Named pool layouts, keyed by zone name
///
/// # Example
/// ```yaml
/// default_pool:
///   num_threads: 0        # available parallelism
/// affinity_zones:
///   gui:
///     num_threads: 1
///     thread_name: gui-zone
///   dsp:
///     num_threads: 4
///     stack_size: 4194304
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_pool: ThreadPoolArgs,
    pub affinity_zones: BTreeMap<String, ThreadPoolArgs>,
}

impl EngineConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every pool layout against the engine limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_pool.validate("default")?;
        for (zone, args) in &self.affinity_zones {
            if zone.trim().is_empty() {
                return Err(ConfigError::EmptyZoneName);
            }
            args.validate(zone)?;
        }
        Ok(())
    }
}

/// Load and validate an [`EngineConfig`] from a YAML or TOML file.
///
/// The format is chosen by extension: `.yaml`/`.yml` or `.toml`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigLoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let parse: fn(&str) -> Result<EngineConfig, ConfigLoadError> = match extension.as_deref() {
        Some("yaml") | Some("yml") => EngineConfig::from_yaml_str,
        Some("toml") => EngineConfig::from_toml_str,
        _ => return Err(ConfigLoadError::UnsupportedFormat(path.to_path_buf())),
    };

    let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}
