// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::ConfigError;

/// Failure to acquire an execution resource.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The runtime backing a thread pool could not be built.
    #[error("Failed to build thread pool with {num_threads} thread(s): {source}")]
    PoolBuild {
        num_threads: usize,
        #[source]
        source: std::io::Error,
    },

    /// The pool layout was rejected before any runtime was built.
    #[error("Invalid thread pool layout: {0}")]
    InvalidPoolArgs(#[source] ConfigError),
}
