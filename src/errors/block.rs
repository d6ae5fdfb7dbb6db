// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::{CallError, ConfigError, ResourceError};

/// Top-level error for operations on a [`Block`](crate::engine::Block).
#[derive(Error, Debug)]
pub enum BlockError {
    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// An `activate` or `deactivate` hook returned an error.
    #[error("Block {hook} hook failed: {source:#}")]
    Hook {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl BlockError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlockError::Call(err) if err.is_not_found())
    }
}
