// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::engine::WorkStats;
use crate::errors::CallError;
use crate::ports::{self, InputPort, OutputPort, PortName, PortSet};
use crate::registry::CallRegistry;
use crate::Value;

/// The view of its own block that a [`BlockLogic`](crate::traits::BlockLogic)
/// hook receives.
///
/// A context only exists inside the worker actor, so everything reached
/// through it is already serialized with the block's mailbox.
pub struct WorkContext<'a, L> {
    ports: &'a PortSet,
    calls: &'a CallRegistry<L>,
    stats: &'a WorkStats,
    work_bump: &'a mut bool,
}

impl<'a, L> WorkContext<'a, L> {
    pub(crate) fn new(
        ports: &'a PortSet,
        calls: &'a CallRegistry<L>,
        stats: &'a WorkStats,
        work_bump: &'a mut bool,
    ) -> Self {
        Self {
            ports,
            calls,
            stats,
            work_bump,
        }
    }

    pub fn input(&self, name: impl Into<PortName>) -> Option<&'a Arc<InputPort>> {
        self.ports.input(name.into().as_str())
    }

    pub fn output(&self, name: impl Into<PortName>) -> Option<&'a Arc<OutputPort>> {
        self.ports.output(name.into().as_str())
    }

    pub fn ports(&self) -> &'a PortSet {
        self.ports
    }

    pub fn stats(&self) -> &'a WorkStats {
        self.stats
    }

    /// Forward every label queued on input `name` to every output.
    ///
    /// Returns false when the block has no such input.
    pub fn propagate_labels(&self, name: impl Into<PortName>) -> bool {
        match self.input(name) {
            Some(input) => {
                ports::propagate_labels(input, self.ports.outputs.iter());
                true
            }
            None => false,
        }
    }

    /// Ask for another work iteration without waiting for new port activity.
    pub fn yield_work(&mut self) {
        *self.work_bump = true;
    }

    /// Emit signal `name` with `args` to every connected slot.
    ///
    /// Returns the number of listeners reached.
    pub fn emit_signal(&self, name: &str, args: Vec<Value>) -> Result<usize, CallError> {
        match self.ports.output(name) {
            Some(output) if output.is_signal() => Ok(output.post_message(Value::Array(args))),
            _ => Err(CallError::not_found(name)),
        }
    }

    /// Invoke a registered callable in place, without a mailbox round-trip.
    pub fn opaque_call_handler(&self, target: &mut L, name: &str, args: &[Value]) -> Result<Value, CallError> {
        self.calls.invoke(name, target, args)
    }
}
