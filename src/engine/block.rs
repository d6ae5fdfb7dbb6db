// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::engine::actor::{BlockShared, WorkerActor, WorkerState};
use crate::engine::messages::ActorMessage;
use crate::engine::reply::wait_for_reply;
use crate::engine::{ThreadPool, ThreadPoolArgs, WorkStats};
use crate::errors::{BlockError, CallError, ConfigError};
use crate::observability::messages::block::{BlockRebound, BlockShutdownFailed};
use crate::observability::messages::StructuredLog;
use crate::ports::{
    validate_domain, validate_port_name, DType, InputPort, OutputPort, PortDirection, PortInfo, PortMap, PortName,
    PortSet,
};
use crate::registry::Callable;
use crate::traits::{BlockLogic, BufferManager};
use crate::Value;

static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// The public handle of a dataflow block.
///
/// A block owns its ports, its callable registry and exactly one worker
/// actor, which in turn owns the block logic `L`. Configuration
/// (`setup_*`, `register_*`, rebinding) needs `&mut self`; calls, stats and
/// activation go through the actor's mailbox and only need `&self`, so a
/// block can be shared across threads behind an `Arc`.
///
/// Dropping a block shuts its actor down and waits for it: once `drop`
/// returns, the logic and every port queue have been released.
///
/// ```no_run
/// use the_blockflow::engine::Block;
/// use the_blockflow::ports::DType;
/// use the_blockflow::registry::Callable;
/// use the_blockflow::traits::BlockLogic;
/// use serde_json::json;
///
/// struct Gain { gain: f64 }
/// impl BlockLogic for Gain {}
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut block = Block::new(Gain { gain: 1.0 })?;
/// block.setup_input("in0", DType::new("float32")?)?;
/// block.setup_output("out0", DType::new("float32")?)?;
/// block.register_callable("setGain", Callable::arity1(|g: &mut Gain, gain: f64| {
///     g.gain = gain;
///     Ok(())
/// }))?;
///
/// block.opaque_call_method("setGain", &[json!(2.5)])?;
/// assert_eq!(block.work_stats()?.num_calls, 1);
/// # Ok(())
/// # }
/// ```
pub struct Block<L: BlockLogic> {
    shared: Arc<BlockShared>,
    pool: ThreadPool,
    actor: WorkerActor<L>,
    ports: PortSet,
    /// Registered call names and arities, for the fast-fail lookup
    calls: BTreeMap<String, usize>,
}

impl<L: BlockLogic> Block<L> {
    /// Create a block bound to the process-wide default pool.
    pub fn new(logic: L) -> Result<Self, BlockError> {
        let pool = ThreadPool::global()?;
        Ok(Self::with_thread_pool(logic, &pool))
    }

    pub fn with_thread_pool(logic: L, pool: &ThreadPool) -> Self {
        let shared = Arc::new(BlockShared::new(NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed)));
        let actor = WorkerActor::spawn(pool, Arc::clone(&shared), WorkerState::new(logic), 0);
        Self {
            shared,
            pool: pool.clone(),
            actor,
            ports: PortSet::default(),
            calls: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Identity of the current actor; bumped on every pool rebind.
    pub fn generation(&self) -> u64 {
        self.actor.generation()
    }

    pub fn thread_pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Move the block's actor onto `pool`.
    ///
    /// A no-op when `pool` shares the current runtime. Otherwise the current
    /// actor finishes everything already in its mailbox, hands its state
    /// over, and a replacement actor is spawned on `pool` with that state.
    pub fn set_thread_pool(&mut self, pool: &ThreadPool) -> Result<(), BlockError> {
        if *pool == self.pool {
            return Ok(());
        }

        let (reply, rx) = oneshot::channel();
        self.actor.send(ActorMessage::Handoff { reply })?;
        let state = wait_for_reply(rx)?;

        let generation = self.actor.generation() + 1;
        self.actor = WorkerActor::spawn(pool, Arc::clone(&self.shared), state, generation);
        BlockRebound {
            block_id: self.shared.id,
            from_pool: self.pool.id(),
            to_pool: pool.id(),
            generation,
        }
        .log();
        self.pool = pool.clone();
        Ok(())
    }

    /// Build a dedicated pool from `args` and rebind to it.
    ///
    /// A pool that fails to build leaves the current binding untouched.
    pub fn set_thread_pool_args(&mut self, args: ThreadPoolArgs) -> Result<(), BlockError> {
        let pool = ThreadPool::new(args)?;
        self.set_thread_pool(&pool)
    }

    fn ensure_inactive(&self, operation: &'static str) -> Result<(), ConfigError> {
        if self.shared.is_active() {
            return Err(ConfigError::BlockActive { operation });
        }
        Ok(())
    }

    fn check_input_free(&self, name: &str) -> Result<(), ConfigError> {
        if self.ports.inputs.contains(name) {
            return Err(ConfigError::DuplicatePort {
                direction: PortDirection::Input,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_output_free(&self, name: &str) -> Result<(), ConfigError> {
        if self.ports.outputs.contains(name) {
            return Err(ConfigError::DuplicatePort {
                direction: PortDirection::Output,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn allocate_input(&mut self, name: String, dtype: DType, domain: &str, is_slot: bool) -> Result<Arc<InputPort>, BlockError> {
        let port = Arc::new(InputPort::with_waker(
            name.clone(),
            dtype,
            domain.to_string(),
            is_slot,
            Arc::clone(&self.shared.waker),
        ));
        self.actor.send(ActorMessage::AllocateInput(Arc::clone(&port)))?;
        self.ports.inputs.push(name, Arc::clone(&port));
        Ok(port)
    }

    fn allocate_output(&mut self, name: String, dtype: DType, domain: &str, is_signal: bool) -> Result<Arc<OutputPort>, BlockError> {
        let port = Arc::new(OutputPort::with_options(name.clone(), dtype, domain.to_string(), is_signal));
        self.actor.send(ActorMessage::AllocateOutput(Arc::clone(&port)))?;
        self.ports.outputs.push(name, Arc::clone(&port));
        Ok(port)
    }

    pub fn setup_input(&mut self, name: impl Into<PortName>, dtype: DType) -> Result<Arc<InputPort>, BlockError> {
        self.setup_input_in_domain(name, dtype, "")
    }

    pub fn setup_input_in_domain(
        &mut self,
        name: impl Into<PortName>,
        dtype: DType,
        domain: &str,
    ) -> Result<Arc<InputPort>, BlockError> {
        let name = name.into().into_string();
        self.ensure_inactive("set up an input port")?;
        validate_port_name(&name)?;
        validate_domain(&name, domain)?;
        self.check_input_free(&name)?;
        self.allocate_input(name, dtype, domain, false)
    }

    pub fn setup_output(&mut self, name: impl Into<PortName>, dtype: DType) -> Result<Arc<OutputPort>, BlockError> {
        self.setup_output_in_domain(name, dtype, "")
    }

    pub fn setup_output_in_domain(
        &mut self,
        name: impl Into<PortName>,
        dtype: DType,
        domain: &str,
    ) -> Result<Arc<OutputPort>, BlockError> {
        let name = name.into().into_string();
        self.ensure_inactive("set up an output port")?;
        validate_port_name(&name)?;
        validate_domain(&name, domain)?;
        self.check_output_free(&name)?;
        self.allocate_output(name, dtype, domain, false)
    }

    /// Register `callable` under `name`.
    ///
    /// A callable taking one or more arguments is also exposed as a slot of
    /// the same name, so connected signals can invoke it, and its name must
    /// then be a valid port name. Registering a name again replaces the
    /// previous callable.
    pub fn register_callable(&mut self, name: impl Into<String>, callable: Callable<L>) -> Result<(), BlockError> {
        let name = name.into();
        self.ensure_inactive("register a callable")?;
        if name.is_empty() {
            return Err(ConfigError::EmptyCallName.into());
        }
        let num_args = callable.num_args();
        let needs_slot = num_args > 0 && !self.has_slot(&name);
        if needs_slot {
            validate_port_name(&name)?;
            self.check_input_free(&name)?;
        }

        self.actor.send(ActorMessage::RegisterCall {
            name: name.clone(),
            callable,
        })?;
        self.calls.insert(name.clone(), num_args);
        if needs_slot {
            self.allocate_input(name, DType::empty(), "", true)?;
        }
        Ok(())
    }

    /// Add a slot input named `name`. Idempotent for an existing slot.
    pub fn register_slot(&mut self, name: impl Into<String>) -> Result<Arc<InputPort>, BlockError> {
        let name = name.into();
        self.ensure_inactive("register a slot")?;
        validate_port_name(&name)?;
        if let Some(port) = self.ports.input(&name).filter(|port| port.is_slot()) {
            return Ok(Arc::clone(port));
        }
        self.check_input_free(&name)?;
        self.allocate_input(name, DType::empty(), "", true)
    }

    /// Add a signal output named `name`. Idempotent for an existing signal.
    pub fn register_signal(&mut self, name: impl Into<String>) -> Result<Arc<OutputPort>, BlockError> {
        let name = name.into();
        self.ensure_inactive("register a signal")?;
        validate_port_name(&name)?;
        if let Some(port) = self.ports.output(&name).filter(|port| port.is_signal()) {
            return Ok(Arc::clone(port));
        }
        self.check_output_free(&name)?;
        self.allocate_output(name, DType::empty(), "", true)
    }

    fn has_slot(&self, name: &str) -> bool {
        self.ports.input(name).is_some_and(|port| port.is_slot())
    }

    pub fn input(&self, name: impl Into<PortName>) -> Option<&Arc<InputPort>> {
        self.ports.input(name.into().as_str())
    }

    pub fn output(&self, name: impl Into<PortName>) -> Option<&Arc<OutputPort>> {
        self.ports.output(name.into().as_str())
    }

    pub fn inputs(&self) -> &PortMap<InputPort> {
        &self.ports.inputs
    }

    pub fn outputs(&self) -> &PortMap<OutputPort> {
        &self.ports.outputs
    }

    /// Descriptors for every input, in declaration order.
    pub fn input_port_info(&self) -> Vec<PortInfo> {
        self.ports.input_info()
    }

    /// Descriptors for every output, in declaration order.
    pub fn output_port_info(&self) -> Vec<PortInfo> {
        self.ports.output_info()
    }

    /// Registered call names, sorted.
    pub fn call_names(&self) -> Vec<&str> {
        self.calls.keys().map(String::as_str).collect()
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    /// Run the logic's `activate` hook and start the work loop.
    ///
    /// Activating an active block does nothing. A failing hook leaves the
    /// block inactive.
    pub fn activate(&self) -> Result<(), BlockError> {
        let (reply, rx) = oneshot::channel();
        self.actor.send(ActorMessage::Activate { reply })?;
        wait_for_reply(rx)?.map_err(|source| BlockError::Hook {
            hook: "activate",
            source,
        })
    }

    /// Stop the work loop and run the logic's `deactivate` hook.
    ///
    /// The block is inactive afterwards even if the hook fails.
    pub fn deactivate(&self) -> Result<(), BlockError> {
        let (reply, rx) = oneshot::channel();
        self.actor.send(ActorMessage::Deactivate { reply })?;
        wait_for_reply(rx)?.map_err(|source| BlockError::Hook {
            hook: "deactivate",
            source,
        })
    }

    /// Ask the actor for another work iteration as soon as it is free.
    pub fn yield_work(&self) -> Result<(), CallError> {
        self.actor.send(ActorMessage::Yield)
    }

    /// Invoke `name` with `args` from outside the actor.
    ///
    /// A signal output named `name` receives `args` as one message and the
    /// call returns `Value::Null` immediately. Anything else is a registered
    /// call: unknown names fail without touching the mailbox, known ones are
    /// executed by the actor while this thread waits for the result.
    pub fn opaque_call_method(&self, name: &str, args: &[Value]) -> Result<Value, CallError> {
        if let Some(signal) = self.ports.output(name).filter(|port| port.is_signal()) {
            signal.post_message(Value::Array(args.to_vec()));
            return Ok(Value::Null);
        }
        if !self.calls.contains_key(name) {
            return Err(CallError::not_found(name));
        }

        let (reply, rx) = oneshot::channel();
        self.actor.send(ActorMessage::OpaqueCall {
            name: name.to_string(),
            args: args.to_vec(),
            reply,
        })?;
        wait_for_reply(rx)?
    }

    /// [`opaque_call_method`](Self::opaque_call_method) with the result
    /// decoded into `R`.
    pub fn call_as<R: DeserializeOwned>(&self, name: &str, args: &[Value]) -> Result<R, CallError> {
        let value = self.opaque_call_method(name, args)?;
        serde_json::from_value(value).map_err(|source| CallError::BadReturn {
            name: name.to_string(),
            source,
        })
    }

    pub fn work_stats(&self) -> Result<WorkStats, CallError> {
        let (reply, rx) = oneshot::channel();
        self.actor.send(ActorMessage::RequestStats { reply })?;
        wait_for_reply(rx)
    }

    /// The logic's preferred buffer manager for input `name` under `domain`.
    pub fn input_buffer_manager(&self, name: &str, domain: &str) -> Result<Option<Arc<dyn BufferManager>>, CallError> {
        self.buffer_manager(PortDirection::Input, name, domain)
    }

    /// The logic's preferred buffer manager for output `name` under `domain`.
    pub fn output_buffer_manager(&self, name: &str, domain: &str) -> Result<Option<Arc<dyn BufferManager>>, CallError> {
        self.buffer_manager(PortDirection::Output, name, domain)
    }

    fn buffer_manager(
        &self,
        direction: PortDirection,
        name: &str,
        domain: &str,
    ) -> Result<Option<Arc<dyn BufferManager>>, CallError> {
        let (reply, rx) = oneshot::channel();
        self.actor.send(ActorMessage::BufferManager {
            direction,
            name: name.to_string(),
            domain: domain.to_string(),
            reply,
        })?;
        wait_for_reply(rx)
    }
}

impl<L: BlockLogic> Drop for Block<L> {
    fn drop(&mut self) {
        let (reply, rx) = oneshot::channel();
        let outcome = self
            .actor
            .send(ActorMessage::Shutdown { reply })
            .and_then(|()| wait_for_reply(rx));
        if let Err(error) = outcome {
            BlockShutdownFailed {
                block_id: self.shared.id,
                error: &error,
            }
            .log();
        }
    }
}

impl<L: BlockLogic> std::fmt::Debug for Block<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.shared.id)
            .field("generation", &self.actor.generation())
            .field("pool", &self.pool)
            .field("active", &self.is_active())
            .field("inputs", &self.ports.inputs.len())
            .field("outputs", &self.ports.outputs.len())
            .field("calls", &self.call_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Idle;
    impl BlockLogic for Idle {}

    fn pool() -> ThreadPool {
        ThreadPool::new(ThreadPoolArgs::with_threads(1)).unwrap()
    }

    #[test]
    fn test_duplicate_port_names_rejected_per_direction() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        block.setup_input("x", DType::empty()).unwrap();
        block.setup_output("x", DType::empty()).unwrap();
        let err = block.setup_input("x", DType::empty()).unwrap_err();
        assert!(matches!(
            err,
            BlockError::Config(ConfigError::DuplicatePort {
                direction: PortDirection::Input,
                ..
            })
        ));
        assert_eq!(block.inputs().len(), 1);
    }

    #[test]
    fn test_invalid_domain_leaves_no_port() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        let err = block
            .setup_output_in_domain("out0", DType::empty(), "bad domain")
            .unwrap_err();
        assert!(matches!(err, BlockError::Config(ConfigError::InvalidDomain { .. })));
        assert!(block.output("out0").is_none());
        assert!(block.output_port_info().is_empty());
    }

    #[test]
    fn test_numeric_port_names() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        block.setup_input(0usize, DType::new("float32").unwrap()).unwrap();
        assert!(block.input("0").is_some());
        assert!(block.input(0usize).is_some());
    }

    #[test]
    fn test_slot_and_signal_registration_is_idempotent() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        let first = block.register_slot("notify").unwrap();
        let second = block.register_slot("notify").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        block.register_signal("changed").unwrap();
        block.register_signal("changed").unwrap();
        assert_eq!(block.inputs().len(), 1);
        assert_eq!(block.outputs().len(), 1);

        block.setup_output("data", DType::empty()).unwrap();
        assert!(block.register_signal("data").is_err());
    }

    #[test]
    fn test_callable_name_clashing_with_data_input_is_rejected() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        block.setup_input("in0", DType::empty()).unwrap();
        let err = block
            .register_callable("in0", Callable::arity1(|_: &mut Idle, _x: i32| Ok(())))
            .unwrap_err();
        assert!(matches!(err, BlockError::Config(ConfigError::DuplicatePort { .. })));
        assert!(block.call_names().is_empty());
    }

    #[test]
    fn test_only_slot_backed_callables_need_port_names() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        block
            .register_callable("get state", Callable::arity0(|_: &mut Idle| Ok(7)))
            .unwrap();
        assert_eq!(block.call_as::<i32>("get state", &[]).unwrap(), 7);
        assert!(block.inputs().is_empty());

        let err = block
            .register_callable("set state", Callable::arity1(|_: &mut Idle, _x: i32| Ok(())))
            .unwrap_err();
        assert!(matches!(err, BlockError::Config(ConfigError::InvalidPortName { .. })));
        assert_eq!(block.call_names(), vec!["get state"]);

        let err = block
            .register_callable("", Callable::arity0(|_: &mut Idle| Ok(())))
            .unwrap_err();
        assert!(matches!(err, BlockError::Config(ConfigError::EmptyCallName)));
    }

    #[test]
    fn test_call_as_decodes_result() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        block
            .register_callable("pair", Callable::arity2(|_: &mut Idle, a: i32, b: String| Ok((a, b))))
            .unwrap();
        let (a, b): (i32, String) = block.call_as("pair", &[json!(4), json!("four")]).unwrap();
        assert_eq!((a, b), (4, "four".to_string()));

        let err = block.call_as::<bool>("pair", &[json!(4), json!("four")]).unwrap_err();
        assert!(matches!(err, CallError::BadReturn { .. }));
    }

    #[test]
    fn test_activation_round_trip() {
        let block = Block::with_thread_pool(Idle, &pool());
        assert!(!block.is_active());
        block.activate().unwrap();
        block.activate().unwrap();
        assert!(block.is_active());
        block.deactivate().unwrap();
        assert!(!block.is_active());
        assert_eq!(block.work_stats().unwrap().num_activations, 1);
    }

    #[test]
    fn test_set_thread_pool_args_rebinds() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        let before = block.thread_pool().id();
        block.set_thread_pool_args(ThreadPoolArgs::with_threads(1)).unwrap();
        assert_ne!(block.thread_pool().id(), before);
        assert_eq!(block.generation(), 1);
    }

    #[test]
    fn test_default_buffer_managers_abdicate() {
        let mut block = Block::with_thread_pool(Idle, &pool());
        block.setup_input("in0", DType::empty()).unwrap();
        assert!(block.input_buffer_manager("in0", "").unwrap().is_none());
        assert!(block.output_buffer_manager("out0", "cuda:0").unwrap().is_none());
    }
}
