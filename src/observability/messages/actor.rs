// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for worker actor lifecycle and dispatch events.
//!
//! This module contains message types for logging events related to:
//! * Actor spawn, handoff during pool rebinding, and stop
//! * Work cycles and slot dispatch, which open spans for their follow-up events
//! * Failures of opaque calls, slot deliveries and work cycles
//! * Failures of lifecycle hooks the actor cannot report to a caller

use crate::errors::CallError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A worker actor task was spawned on a pool.
///
/// # Log Level
/// `debug!` - Internal lifecycle detail
///
/// # Example
/// ```
/// use the_blockflow::observability::messages::actor::ActorSpawned;
///
/// let msg = ActorSpawned {
///     block_id: 4,
///     generation: 1,
///     pool_id: 2,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ActorSpawned {
    pub block_id: u64,
    pub generation: u64,
    pub pool_id: u64,
}

impl Display for ActorSpawned {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} actor generation {} spawned on pool {}",
            self.block_id, self.generation, self.pool_id
        )
    }
}

impl StructuredLog for ActorSpawned {
    fn log(&self) {
        tracing::debug!(
            block_id = self.block_id,
            generation = self.generation,
            pool_id = self.pool_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "worker_actor",
            span_name = name,
            block_id = self.block_id,
            generation = self.generation,
            pool_id = self.pool_id,
        )
    }
}

/// An actor gave its state up to a replacement and exited.
///
/// # Log Level
/// `debug!` - Internal lifecycle detail
pub struct ActorHandedOff {
    pub block_id: u64,
    pub generation: u64,
}

impl Display for ActorHandedOff {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} actor generation {} handed off its state",
            self.block_id, self.generation
        )
    }
}

impl StructuredLog for ActorHandedOff {
    fn log(&self) {
        tracing::debug!(block_id = self.block_id, generation = self.generation, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "worker_actor",
            span_name = name,
            block_id = self.block_id,
            generation = self.generation,
        )
    }
}

/// An actor processed its shutdown message and released the block's state.
pub struct ActorStopped {
    pub block_id: u64,
    pub generation: u64,
}

impl Display for ActorStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} actor generation {} stopped",
            self.block_id, self.generation
        )
    }
}

impl StructuredLog for ActorStopped {
    fn log(&self) {
        tracing::debug!(block_id = self.block_id, generation = self.generation, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "worker_actor",
            span_name = name,
            block_id = self.block_id,
            generation = self.generation,
        )
    }
}

/// An opaque call failed inside the actor. The error is also returned to
/// the caller; this records it on the actor side.
///
/// # Log Level
/// `debug!` when the call was not found, `warn!` otherwise
///
/// # Example
/// ```
/// use the_blockflow::errors::CallError;
/// use the_blockflow::observability::messages::actor::CallFailed;
///
/// let error = CallError::not_found("setGain");
/// let msg = CallFailed {
///     block_id: 1,
///     call: "setGain",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct CallFailed<'a> {
    pub block_id: u64,
    pub call: &'a str,
    pub error: &'a CallError,
}

impl Display for CallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} call '{}' failed: {}",
            self.block_id, self.call, self.error
        )
    }
}

impl StructuredLog for CallFailed<'_> {
    fn log(&self) {
        if self.error.is_not_found() {
            tracing::debug!(block_id = self.block_id, call = self.call, "{}", self);
        } else {
            tracing::warn!(
                block_id = self.block_id,
                call = self.call,
                error = %self.error,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "opaque_call",
            span_name = name,
            block_id = self.block_id,
            call = self.call,
        )
    }
}

/// A slot delivery failed. Nobody waits on a slot, so this log line is the
/// only report besides the slot error counter.
///
/// # Log Level
/// `warn!` - Recoverable failure
pub struct SlotCallFailed<'a> {
    pub block_id: u64,
    pub slot: &'a str,
    pub error: &'a CallError,
}

impl Display for SlotCallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} slot '{}' failed: {}",
            self.block_id, self.slot, self.error
        )
    }
}

impl StructuredLog for SlotCallFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            block_id = self.block_id,
            slot = self.slot,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "slot_call",
            span_name = name,
            block_id = self.block_id,
            slot = self.slot,
        )
    }
}

/// A work cycle is about to run.
///
/// # Log Level
/// `trace!` - Emitted once per cycle
///
/// # Example
/// ```
/// use the_blockflow::observability::messages::actor::WorkCycleStarted;
/// use the_blockflow::observability::messages::StructuredLog;
///
/// let msg = WorkCycleStarted {
///     block_id: 2,
///     generation: 0,
///     pending_labels: 3,
/// };
///
/// let span = msg.span("work_cycle");
/// let _guard = span.enter();
/// msg.log();
/// ```
pub struct WorkCycleStarted {
    pub block_id: u64,
    pub generation: u64,
    pub pending_labels: usize,
}

impl Display for WorkCycleStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} work cycle started with {} pending label(s)",
            self.block_id, self.pending_labels
        )
    }
}

impl StructuredLog for WorkCycleStarted {
    fn log(&self) {
        tracing::trace!(
            block_id = self.block_id,
            generation = self.generation,
            pending_labels = self.pending_labels,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "work",
            span_name = name,
            block_id = self.block_id,
            generation = self.generation,
        )
    }
}

/// Queued slot messages are about to be delivered to their callable.
///
/// # Log Level
/// `trace!` - Emitted once per slot with pending messages
pub struct SlotDispatchStarted<'a> {
    pub block_id: u64,
    pub slot: &'a str,
    pub pending: usize,
}

impl Display for SlotDispatchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} dispatching {} message(s) to slot '{}'",
            self.block_id, self.pending, self.slot
        )
    }
}

impl StructuredLog for SlotDispatchStarted<'_> {
    fn log(&self) {
        tracing::trace!(
            block_id = self.block_id,
            slot = self.slot,
            pending = self.pending,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "slot_call",
            span_name = name,
            block_id = self.block_id,
            slot = self.slot,
        )
    }
}

/// A work cycle returned an error or panicked.
///
/// # Log Level
/// `warn!` - Recoverable failure; the actor keeps running
pub struct WorkFailed<'a> {
    pub block_id: u64,
    pub error: &'a anyhow::Error,
}

impl Display for WorkFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Block {} work failed: {:#}", self.block_id, self.error)
    }
}

impl StructuredLog for WorkFailed<'_> {
    fn log(&self) {
        tracing::warn!(block_id = self.block_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("work", span_name = name, block_id = self.block_id)
    }
}

/// A lifecycle hook failed where no caller is waiting for the result, such
/// as `deactivate` during shutdown.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct HookFailed<'a> {
    pub block_id: u64,
    pub hook: &'a str,
    pub error: &'a anyhow::Error,
}

impl Display for HookFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Block {} {} hook failed: {:#}",
            self.block_id, self.hook, self.error
        )
    }
}

impl StructuredLog for HookFailed<'_> {
    fn log(&self) {
        tracing::error!(
            block_id = self.block_id,
            hook = self.hook,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "hook",
            span_name = name,
            block_id = self.block_id,
            hook = self.hook,
        )
    }
}
