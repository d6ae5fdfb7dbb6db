// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::engine::actor::WorkerState;
use crate::engine::WorkStats;
use crate::errors::CallError;
use crate::ports::{InputPort, OutputPort, PortDirection};
use crate::registry::Callable;
use crate::traits::BufferManager;
use crate::Value;

/// Mailbox traffic from a block handle to its worker actor.
///
/// Variants carrying a `reply` are request/response pairs; the handle blocks
/// on the receiving half until the actor fulfils it.
pub(crate) enum ActorMessage<L> {
    AllocateInput(Arc<InputPort>),
    AllocateOutput(Arc<OutputPort>),
    RegisterCall {
        name: String,
        callable: Callable<L>,
    },
    OpaqueCall {
        name: String,
        args: Vec<Value>,
        reply: oneshot::Sender<Result<Value, CallError>>,
    },
    Activate {
        reply: oneshot::Sender<anyhow::Result<()>>,
    },
    Deactivate {
        reply: oneshot::Sender<anyhow::Result<()>>,
    },
    BufferManager {
        direction: PortDirection,
        name: String,
        domain: String,
        reply: oneshot::Sender<Option<Arc<dyn BufferManager>>>,
    },
    RequestStats {
        reply: oneshot::Sender<WorkStats>,
    },
    Yield,
    /// Give up the block's state to a replacement actor and exit.
    Handoff {
        reply: oneshot::Sender<WorkerState<L>>,
    },
    /// Terminal message; nothing after it is processed.
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl<L> ActorMessage<L> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ActorMessage::AllocateInput(_) => "allocate_input",
            ActorMessage::AllocateOutput(_) => "allocate_output",
            ActorMessage::RegisterCall { .. } => "register_call",
            ActorMessage::OpaqueCall { .. } => "opaque_call",
            ActorMessage::Activate { .. } => "activate",
            ActorMessage::Deactivate { .. } => "deactivate",
            ActorMessage::BufferManager { .. } => "buffer_manager",
            ActorMessage::RequestStats { .. } => "request_stats",
            ActorMessage::Yield => "yield",
            ActorMessage::Handoff { .. } => "handoff",
            ActorMessage::Shutdown { .. } => "shutdown",
        }
    }
}

impl<L> fmt::Debug for ActorMessage<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActorMessage").field(&self.kind()).finish()
    }
}
