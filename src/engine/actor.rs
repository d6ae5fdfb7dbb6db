// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The worker actor: one task per block, serializing all access to the
//! block's logic, ports, registry and counters.
//!
//! The actor owns a [`WorkerState`] and an unbounded mailbox. Each loop
//! iteration waits for either mailbox traffic or a port wake, drains the
//! mailbox, then (while active) dispatches queued slot calls, runs one work
//! cycle and flushes posted labels downstream. Rebinding to another pool
//! hands the whole state to a freshly spawned actor through the mailbox, so
//! nothing queued before the handoff is lost and nothing after it reaches
//! the old actor.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, Notify};

use crate::engine::messages::ActorMessage;
use crate::engine::{ThreadPool, WorkContext, WorkStats};
use crate::errors::CallError;
use crate::observability::messages::actor::{
    ActorHandedOff, ActorSpawned, ActorStopped, CallFailed, HookFailed, SlotCallFailed,
    SlotDispatchStarted, WorkCycleStarted, WorkFailed,
};
use crate::observability::messages::block::{BlockActivated, BlockDeactivated, CallableReplaced};
use crate::observability::messages::StructuredLog;
use crate::ports::{InputPort, PortDirection, PortSet};
use crate::registry::{panic_message, CallRegistry};
use crate::traits::BlockLogic;
use crate::Value;

/// State that outlives any single actor and is visible to the block handle
/// without a mailbox round-trip.
#[derive(Debug)]
pub(crate) struct BlockShared {
    pub(crate) id: u64,
    pub(crate) active: AtomicBool,
    /// Signalled by the block's input ports on every arrival
    pub(crate) waker: Arc<Notify>,
}

impl BlockShared {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            active: AtomicBool::new(false),
            waker: Arc::new(Notify::new()),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Everything a replacement actor adopts during a pool rebind.
pub(crate) struct WorkerState<L> {
    pub(crate) logic: L,
    pub(crate) ports: PortSet,
    pub(crate) calls: CallRegistry<L>,
    pub(crate) stats: WorkStats,
    pub(crate) work_bump: bool,
}

impl<L: BlockLogic> WorkerState<L> {
    pub(crate) fn new(logic: L) -> Self {
        Self {
            logic,
            ports: PortSet::default(),
            calls: CallRegistry::new(),
            stats: WorkStats::default(),
            work_bump: false,
        }
    }

    fn with_context<T>(&mut self, f: impl FnOnce(&mut L, &mut WorkContext<'_, L>) -> T) -> T {
        let mut ctx = WorkContext::new(&self.ports, &self.calls, &self.stats, &mut self.work_bump);
        f(&mut self.logic, &mut ctx)
    }
}

/// Run block code off the async scheduler, converting panics to errors.
///
/// Block code is free to make blocking calls into other blocks, so the
/// worker thread is handed off for the duration.
fn run_blocking<T>(hook: &str, f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    tokio::task::block_in_place(|| match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("{} panicked: {}", hook, panic_message(payload))),
    })
}

/// Slot messages carry an argument list; anything else is a single argument.
fn slot_args(message: Value) -> Vec<Value> {
    match message {
        Value::Array(args) => args,
        other => vec![other],
    }
}

enum Flow<L> {
    Continue,
    Handoff(oneshot::Sender<WorkerState<L>>),
    Shutdown(Option<oneshot::Sender<()>>),
}

/// The handle side of a running actor.
pub(crate) struct WorkerActor<L> {
    mailbox: UnboundedSender<ActorMessage<L>>,
    generation: u64,
}

impl<L: BlockLogic> WorkerActor<L> {
    /// Spawn an actor on `pool` that takes ownership of `state`.
    pub(crate) fn spawn(pool: &ThreadPool, shared: Arc<BlockShared>, state: WorkerState<L>, generation: u64) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        ActorSpawned {
            block_id: shared.id,
            generation,
            pool_id: pool.id(),
        }
        .log();

        let task = ActorTask {
            shared,
            state,
            inbox,
            generation,
        };
        pool.handle().spawn(task.run());
        Self { mailbox, generation }
    }

    pub(crate) fn send(&self, message: ActorMessage<L>) -> Result<(), CallError> {
        self.mailbox.send(message).map_err(|_| CallError::ActorGone)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

struct ActorTask<L> {
    shared: Arc<BlockShared>,
    state: WorkerState<L>,
    inbox: UnboundedReceiver<ActorMessage<L>>,
    generation: u64,
}

impl<L: BlockLogic> ActorTask<L> {
    async fn run(mut self) {
        // Pick up any arrivals or pending yield adopted from a previous actor.
        self.shared.waker.notify_one();

        loop {
            if self.state.work_bump {
                self.state.work_bump = false;
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    biased;
                    message = self.inbox.recv() => {
                        let flow = match message {
                            Some(message) => self.handle(message),
                            None => Flow::Shutdown(None),
                        };
                        if !matches!(flow, Flow::Continue) {
                            return self.stop(flow);
                        }
                    }
                    _ = self.shared.waker.notified() => {}
                }
            }

            loop {
                let flow = match self.inbox.try_recv() {
                    Ok(message) => self.handle(message),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => Flow::Shutdown(None),
                };
                if !matches!(flow, Flow::Continue) {
                    return self.stop(flow);
                }
            }

            if self.shared.is_active() {
                self.dispatch_slots();
                self.work_cycle();
            }
        }
    }

    fn handle(&mut self, message: ActorMessage<L>) -> Flow<L> {
        match message {
            ActorMessage::AllocateInput(port) => {
                self.state.ports.inputs.push(port.name().to_string(), port);
            }
            ActorMessage::AllocateOutput(port) => {
                self.state.ports.outputs.push(port.name().to_string(), port);
            }
            ActorMessage::RegisterCall { name, callable } => {
                if self.state.calls.insert(name.clone(), callable).is_some() {
                    CallableReplaced {
                        block_id: self.shared.id,
                        name: &name,
                    }
                    .log();
                }
            }
            ActorMessage::OpaqueCall { name, args, reply } => {
                let result = self.invoke(&name, &args);
                self.state.stats.record_call(result.is_ok());
                if let Err(error) = &result {
                    CallFailed {
                        block_id: self.shared.id,
                        call: &name,
                        error,
                    }
                    .log();
                }
                let _ = reply.send(result);
            }
            ActorMessage::Activate { reply } => {
                let _ = reply.send(self.activate());
            }
            ActorMessage::Deactivate { reply } => {
                let _ = reply.send(self.deactivate());
            }
            ActorMessage::BufferManager {
                direction,
                name,
                domain,
                reply,
            } => {
                let logic = &mut self.state.logic;
                let manager = run_blocking("buffer manager query", || {
                    Ok(match direction {
                        PortDirection::Input => logic.input_buffer_manager(&name, &domain),
                        PortDirection::Output => logic.output_buffer_manager(&name, &domain),
                    })
                });
                let _ = reply.send(manager.unwrap_or_else(|error| {
                    HookFailed {
                        block_id: self.shared.id,
                        hook: "buffer_manager",
                        error: &error,
                    }
                    .log();
                    None
                }));
            }
            ActorMessage::RequestStats { reply } => {
                let _ = reply.send(self.state.stats.clone());
            }
            ActorMessage::Yield => {
                self.state.work_bump = true;
            }
            ActorMessage::Handoff { reply } => return Flow::Handoff(reply),
            ActorMessage::Shutdown { reply } => return Flow::Shutdown(Some(reply)),
        }
        Flow::Continue
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, CallError> {
        let state = &mut self.state;
        tokio::task::block_in_place(|| state.calls.invoke(name, &mut state.logic, args))
    }

    fn activate(&mut self) -> anyhow::Result<()> {
        if self.shared.is_active() {
            return Ok(());
        }
        let state = &mut self.state;
        run_blocking("activate", || state.with_context(|logic, ctx| logic.activate(ctx)))?;
        self.shared.active.store(true, Ordering::Release);
        self.state.stats.num_activations += 1;
        BlockActivated {
            block_id: self.shared.id,
            generation: self.generation,
        }
        .log();
        Ok(())
    }

    /// The block is inactive afterwards even when the hook fails.
    fn deactivate(&mut self) -> anyhow::Result<()> {
        if !self.shared.is_active() {
            return Ok(());
        }
        self.shared.active.store(false, Ordering::Release);
        let state = &mut self.state;
        let result = run_blocking("deactivate", || state.with_context(|logic, ctx| logic.deactivate(ctx)));
        BlockDeactivated {
            block_id: self.shared.id,
            generation: self.generation,
        }
        .log();
        result
    }

    fn dispatch_slots(&mut self) {
        let slots: Vec<Arc<InputPort>> = self
            .state
            .ports
            .inputs
            .iter()
            .filter(|port| port.is_slot())
            .cloned()
            .collect();

        for slot in slots {
            let pending = slot.pending_messages();
            if pending == 0 {
                continue;
            }
            let start_msg = SlotDispatchStarted {
                block_id: self.shared.id,
                slot: slot.name(),
                pending,
            };
            let span = start_msg.span("slot_dispatch");
            let _guard = span.enter();
            start_msg.log();

            while let Some(message) = slot.pop_message() {
                let args = slot_args(message);
                let result = self.invoke(slot.name(), &args);
                self.state.stats.record_slot_call(result.is_ok());
                if let Err(error) = &result {
                    SlotCallFailed {
                        block_id: self.shared.id,
                        slot: slot.name(),
                        error,
                    }
                    .log();
                }
            }
        }
    }

    fn work_cycle(&mut self) {
        // Labels that arrived before the cycle and were not taken by the
        // logic are dropped afterwards; later arrivals wait for the next one.
        let marks: Vec<(Arc<InputPort>, u64)> = self
            .state
            .ports
            .inputs
            .iter()
            .filter(|port| !port.is_slot())
            .map(|port| (Arc::clone(port), port.total_labels()))
            .collect();

        let start_msg = WorkCycleStarted {
            block_id: self.shared.id,
            generation: self.generation,
            pending_labels: marks.iter().map(|(port, _)| port.pending_labels()).sum(),
        };
        let span = start_msg.span("work_cycle");
        let _guard = span.enter();
        start_msg.log();

        let started = Instant::now();
        let state = &mut self.state;
        let result = run_blocking("work", || state.with_context(|logic, ctx| logic.work(ctx)));
        let elapsed = started.elapsed();

        for output in self.state.ports.outputs.iter() {
            output.flush_labels();
        }
        for (input, mark) in &marks {
            input.discard_labels_before(*mark);
        }
        self.state.stats.record_work(elapsed, result.is_ok());

        if let Err(error) = &result {
            WorkFailed {
                block_id: self.shared.id,
                error,
            }
            .log();
        }
    }

    fn stop(mut self, flow: Flow<L>) {
        match flow {
            Flow::Continue => {}
            Flow::Handoff(reply) => {
                ActorHandedOff {
                    block_id: self.shared.id,
                    generation: self.generation,
                }
                .log();
                // The handle waits on this reply; if it is gone the state is
                // dropped here with the task.
                let _ = reply.send(self.state);
            }
            Flow::Shutdown(reply) => {
                if let Err(error) = self.deactivate() {
                    HookFailed {
                        block_id: self.shared.id,
                        hook: "deactivate",
                        error: &error,
                    }
                    .log();
                }
                let ActorTask {
                    shared,
                    state,
                    inbox,
                    generation,
                } = self;
                drop(inbox);
                drop(state);
                ActorStopped {
                    block_id: shared.id,
                    generation,
                }
                .log();
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
        }
    }
}
