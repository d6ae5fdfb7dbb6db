// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for block lifecycle events.

use crate::errors::CallError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Block activated and entered its work loop.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_blockflow::observability::messages::block::BlockActivated;
///
/// let msg = BlockActivated {
///     block_id: 2,
///     generation: 0,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BlockActivated {
    pub block_id: u64,
    pub generation: u64,
}

impl Display for BlockActivated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Block {} activated", self.block_id)
    }
}

impl StructuredLog for BlockActivated {
    fn log(&self) {
        tracing::info!(block_id = self.block_id, generation = self.generation, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "block",
            span_name = name,
            block_id = self.block_id,
            generation = self.generation,
        )
    }
}

/// Block left its work loop.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BlockDeactivated {
    pub block_id: u64,
    pub generation: u64,
}

impl Display for BlockDeactivated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Block {} deactivated", self.block_id)
    }
}

impl StructuredLog for BlockDeactivated {
    fn log(&self) {
        tracing::info!(block_id = self.block_id, generation = self.generation, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "block",
            span_name = name,
            block_id = self.block_id,
            generation = self.generation,
        )
    }
}

/// Block moved to another thread pool under a new actor.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BlockRebound {
    pub block_id: u64,
    pub from_pool: u64,
    pub to_pool: u64,
    pub generation: u64,
}

impl Display for BlockRebound {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} rebound from pool {} to pool {} (actor generation {})",
            self.block_id, self.from_pool, self.to_pool, self.generation
        )
    }
}

impl StructuredLog for BlockRebound {
    fn log(&self) {
        tracing::info!(
            block_id = self.block_id,
            from_pool = self.from_pool,
            to_pool = self.to_pool,
            generation = self.generation,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "block",
            span_name = name,
            block_id = self.block_id,
            to_pool = self.to_pool,
        )
    }
}

/// A callable registration replaced an existing entry of the same name.
///
/// # Log Level
/// `debug!`
pub struct CallableReplaced<'a> {
    pub block_id: u64,
    pub name: &'a str,
}

impl Display for CallableReplaced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Block {} replaced callable '{}'", self.block_id, self.name)
    }
}

impl StructuredLog for CallableReplaced<'_> {
    fn log(&self) {
        tracing::debug!(block_id = self.block_id, name = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "block",
            span_name = name,
            block_id = self.block_id,
            callable = self.name,
        )
    }
}

/// The actor could not confirm shutdown while the block was dropped.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct BlockShutdownFailed<'a> {
    pub block_id: u64,
    pub error: &'a CallError,
}

impl Display for BlockShutdownFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Block {} shutdown was not confirmed: {}", self.block_id, self.error)
    }
}

impl StructuredLog for BlockShutdownFailed<'_> {
    fn log(&self) {
        tracing::error!(block_id = self.block_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("block", span_name = name, block_id = self.block_id)
    }
}
