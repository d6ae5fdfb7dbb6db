// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for loading engine configuration files.

use std::path::PathBuf;
use thiserror::Error;

use super::ConfigError;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension is neither YAML nor TOML.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Configuration validation failed: {0}")]
    Invalid(#[from] ConfigError),
}
