// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for a consistent human-readable
//! line and [`StructuredLog`] to emit that line with its fields as
//! structured `tracing` data.
//!
//! # Organization
//!
//! * `actor` - Worker actor spawn, handoff, stop, and dispatch failures
//! * `block` - Block activation, rebinding, registration and teardown
//! * `pool` - Thread pool lifecycle
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_blockflow::observability::messages::block::BlockActivated;
//!
//! let msg = BlockActivated {
//!     block_id: 7,
//!     generation: 0,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

pub mod actor;
pub mod block;
pub mod pool;

use tracing::Span;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message at its level, fields attached.
    fn log(&self);

    /// A span carrying the message's fields, for scoping follow-up events.
    fn span(&self, name: &str) -> Span;
}
