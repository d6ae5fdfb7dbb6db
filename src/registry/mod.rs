// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-block dispatch table from method names to callables.

mod callable;

pub use callable::Callable;
pub(crate) use callable::panic_message;

use std::collections::HashMap;
use std::fmt;

use crate::errors::CallError;
use crate::Value;

/// Maps method names to [`Callable`]s for one block.
///
/// This is a deliberate dynamic-dispatch table: control-plane calls and
/// slot deliveries both resolve through it by name.
pub struct CallRegistry<L> {
    calls: HashMap<String, Callable<L>>,
}

impl<L> Default for CallRegistry<L> {
    fn default() -> Self {
        Self {
            calls: HashMap::new(),
        }
    }
}

impl<L> CallRegistry<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callable` under `name`, returning the entry it replaced.
    pub fn insert(&mut self, name: impl Into<String>, callable: Callable<L>) -> Option<Callable<L>> {
        self.calls.insert(name.into(), callable)
    }

    pub fn get(&self, name: &str) -> Option<&Callable<L>> {
        self.calls.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.calls.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.calls.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up `name` and invoke it against `target`.
    pub fn invoke(&self, name: &str, target: &mut L, args: &[Value]) -> Result<Value, CallError> {
        let callable = self.get(name).ok_or_else(|| CallError::not_found(name))?;
        callable.call(name, target, args)
    }
}

impl<L> fmt::Debug for CallRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRegistry")
            .field("call_count", &self.calls.len())
            .field("call_names", &self.names())
            .finish()
    }
}
