// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic and operational log line emitted by the engine goes
//! through a message struct in [`messages`]. Each struct implements
//! `Display` for the human-readable line and
//! [`StructuredLog`](messages::StructuredLog) to emit it at its level with
//! its fields attached.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::actor` - Worker actor lifecycle and dispatch failures
//! * `messages::block` - Block activation, rebinding and teardown
//! * `messages::pool` - Thread pool creation and release
//!
//! # Usage
//!
//! ```rust
//! use the_blockflow::observability::messages::pool::PoolCreated;
//! use the_blockflow::observability::messages::StructuredLog;
//!
//! the_blockflow::observability::init_tracing();
//!
//! PoolCreated {
//!     pool_id: 1,
//!     num_threads: 4,
//!     thread_name: "blockflow-pool",
//! }
//! .log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

use crate::config::consts::DEFAULT_LOG_FILTER;

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to the `info` level when `RUST_LOG` is unset or invalid.
/// Calling this more than once, or after another subscriber was installed,
/// leaves the existing subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing initialized twice without panicking");
    }
}
