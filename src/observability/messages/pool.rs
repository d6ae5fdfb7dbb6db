// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for thread pool lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A dedicated runtime was built for a new thread pool.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_blockflow::observability::messages::pool::PoolCreated;
///
/// let msg = PoolCreated {
///     pool_id: 3,
///     num_threads: 2,
///     thread_name: "zone-dsp",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PoolCreated<'a> {
    pub pool_id: u64,
    pub num_threads: usize,
    pub thread_name: &'a str,
}

impl Display for PoolCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Thread pool {} created: {} threads named '{}'",
            self.pool_id, self.num_threads, self.thread_name
        )
    }
}

impl StructuredLog for PoolCreated<'_> {
    fn log(&self) {
        tracing::info!(
            pool_id = self.pool_id,
            num_threads = self.num_threads,
            thread_name = self.thread_name,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "thread_pool",
            span_name = name,
            pool_id = self.pool_id,
            num_threads = self.num_threads,
        )
    }
}

/// The last handle to a thread pool was dropped; its runtime shuts down in
/// the background.
///
/// # Log Level
/// `debug!`
pub struct PoolReleased {
    pub pool_id: u64,
}

impl Display for PoolReleased {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Thread pool {} released", self.pool_id)
    }
}

impl StructuredLog for PoolReleased {
    fn log(&self) {
        tracing::debug!(pool_id = self.pool_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("thread_pool", span_name = name, pool_id = self.pool_id)
    }
}
