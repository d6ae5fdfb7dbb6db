// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shareable execution contexts for worker actors.
//!
//! A [`ThreadPool`] is a reference-counted handle to a dedicated multi-thread
//! tokio runtime. Blocks bound to the same pool multiplex their actors on the
//! same worker threads, which is how affinity grouping is expressed. The
//! process-wide default pool is held weakly: it lives while any block or
//! caller references it and is rebuilt on the next request after that.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::consts::{DEFAULT_POOL_THREADS, DEFAULT_POOL_THREAD_NAME, MAX_POOL_THREADS};
use crate::errors::{ConfigError, ResourceError};
use crate::observability::messages::pool::{PoolCreated, PoolReleased};
use crate::observability::messages::StructuredLog;

/// Construction parameters for a [`ThreadPool`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadPoolArgs {
    /// Worker thread count; 0 selects the available parallelism
    pub num_threads: usize,
    pub thread_name: Option<String>,
    pub stack_size: Option<usize>,
}

impl ThreadPoolArgs {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    /// The thread count this layout resolves to on the current machine.
    pub fn resolved_threads(&self) -> usize {
        if self.num_threads > 0 {
            return self.num_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(DEFAULT_POOL_THREADS)
    }

    pub fn resolved_thread_name(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(DEFAULT_POOL_THREAD_NAME)
    }

    /// Check the layout against the engine limits; `scope` names the pool in
    /// the returned error.
    pub fn validate(&self, scope: &str) -> Result<(), ConfigError> {
        if self.num_threads > MAX_POOL_THREADS {
            return Err(ConfigError::InvalidThreadCount {
                scope: scope.to_string(),
                requested: self.num_threads,
                maximum: MAX_POOL_THREADS,
            });
        }
        if self.resolved_thread_name().contains('\0') {
            return Err(ConfigError::InvalidThreadName {
                scope: scope.to_string(),
            });
        }
        if self.stack_size == Some(0) {
            return Err(ConfigError::InvalidStackSize {
                scope: scope.to_string(),
            });
        }
        Ok(())
    }
}

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);
static GLOBAL_POOL: Mutex<Weak<PoolContext>> = Mutex::new(Weak::new());

struct PoolContext {
    id: u64,
    args: ThreadPoolArgs,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl Drop for PoolContext {
    fn drop(&mut self) {
        PoolReleased { pool_id: self.id }.log();
        // The last reference may be dropped from inside one of this pool's
        // own tasks, where a blocking shutdown would panic.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// A shareable handle to a worker-actor execution context.
///
/// Cloning is cheap and shares the same runtime. Two handles compare equal
/// when they share the underlying runtime, regardless of how they were
/// obtained.
#[derive(Clone)]
pub struct ThreadPool {
    context: Arc<PoolContext>,
}

impl ThreadPool {
    pub fn new(args: ThreadPoolArgs) -> Result<Self, ResourceError> {
        args.validate("thread_pool").map_err(ResourceError::InvalidPoolArgs)?;

        let num_threads = args.resolved_threads();
        let mut builder = Builder::new_multi_thread();
        builder
            .worker_threads(num_threads)
            .thread_name(args.resolved_thread_name())
            .enable_all();
        if let Some(stack_size) = args.stack_size {
            builder.thread_stack_size(stack_size);
        }
        let runtime = builder
            .build()
            .map_err(|source| ResourceError::PoolBuild { num_threads, source })?;

        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        PoolCreated {
            pool_id: id,
            num_threads,
            thread_name: args.resolved_thread_name(),
        }
        .log();

        Ok(Self {
            context: Arc::new(PoolContext {
                id,
                args,
                handle: runtime.handle().clone(),
                runtime: Some(runtime),
            }),
        })
    }

    /// The process-wide default pool, created on first use.
    ///
    /// Only a weak reference is retained here, so the pool is torn down when
    /// the last holder drops it and a fresh one is built on the next call.
    pub fn global() -> Result<Self, ResourceError> {
        let mut slot = GLOBAL_POOL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(context) = slot.upgrade() {
            return Ok(Self { context });
        }
        let pool = Self::new(ThreadPoolArgs::default())?;
        *slot = Arc::downgrade(&pool.context);
        Ok(pool)
    }

    pub fn id(&self) -> u64 {
        self.context.id
    }

    pub fn args(&self) -> &ThreadPoolArgs {
        &self.context.args
    }

    /// Number of live handles sharing this pool.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.context)
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.context.handle
    }
}

impl PartialEq for ThreadPool {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.context, &other.context)
    }
}

impl Eq for ThreadPool {}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("id", &self.context.id)
            .field("args", &self.context.args)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

/// Serializes tests that observe the lifetime of the global pool.
#[cfg(test)]
pub(crate) fn global_pool_guard() -> std::sync::MutexGuard<'static, ()> {
    static GUARD: Mutex<()> = Mutex::new(());
    GUARD.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_shared_runtime() {
        let a = ThreadPool::new(ThreadPoolArgs::with_threads(1)).unwrap();
        let b = a.clone();
        let c = ThreadPool::new(ThreadPoolArgs::with_threads(1)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.ref_count(), 2);
    }

    #[test]
    fn test_global_pool_is_shared_while_referenced() {
        let _guard = global_pool_guard();
        let first = ThreadPool::global().unwrap();
        let second = ThreadPool::global().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_global_pool_recreated_after_last_handle_drops() {
        let _guard = global_pool_guard();
        let first = ThreadPool::global().unwrap();
        let first_id = first.id();
        let again = ThreadPool::global().unwrap();
        assert_eq!(again.id(), first_id);
        assert_eq!(first.ref_count(), 2);

        drop(first);
        drop(again);

        let fresh = ThreadPool::global().unwrap();
        assert_ne!(fresh.id(), first_id);
        assert_eq!(fresh.ref_count(), 1);
    }

    #[test]
    fn test_invalid_args_rejected_before_build() {
        let nul_name = ThreadPoolArgs {
            num_threads: 1,
            thread_name: Some("dsp\0zone".to_string()),
            stack_size: None,
        };
        assert!(matches!(
            ThreadPool::new(nul_name),
            Err(ResourceError::InvalidPoolArgs(ConfigError::InvalidThreadName { .. }))
        ));

        let zero_stack = ThreadPoolArgs {
            stack_size: Some(0),
            ..ThreadPoolArgs::with_threads(1)
        };
        assert!(matches!(
            ThreadPool::new(zero_stack),
            Err(ResourceError::InvalidPoolArgs(ConfigError::InvalidStackSize { .. }))
        ));

        let too_many = ThreadPoolArgs::with_threads(MAX_POOL_THREADS + 1);
        assert!(matches!(
            ThreadPool::new(too_many),
            Err(ResourceError::InvalidPoolArgs(ConfigError::InvalidThreadCount { .. }))
        ));
    }

    #[test]
    fn test_args_defaults_resolve() {
        let args = ThreadPoolArgs::default();
        assert!(args.resolved_threads() >= 1);
        assert_eq!(args.resolved_thread_name(), DEFAULT_POOL_THREAD_NAME);
        assert_eq!(ThreadPoolArgs::with_threads(3).resolved_threads(), 3);
    }

    #[test]
    fn test_pool_runs_spawned_work() {
        let pool = ThreadPool::new(ThreadPoolArgs {
            num_threads: 2,
            thread_name: Some("pool-test".to_string()),
            stack_size: Some(512 * 1024),
        })
        .unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        pool.handle().spawn(async move {
            tx.send(std::thread::current().name().map(str::to_string)).unwrap();
        });
        let name = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("pool-test"));
    }

    #[test]
    fn test_args_deserialize_with_defaults() {
        let args: ThreadPoolArgs = serde_yaml::from_str("num_threads: 2").unwrap();
        assert_eq!(args, ThreadPoolArgs::with_threads(2));
    }
}
