// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;        // engine config + affinity zones
pub mod engine;        // blocks, worker actors, thread pools
pub mod errors;        // error handling
pub mod observability;
pub mod ports;         // dataflow endpoints
pub mod registry;      // callable dispatch table
pub mod traits;        // block logic + buffer managers

/// Dynamic value crossing the call and signal boundary.
pub use serde_json::Value;

pub use engine::{Block, ThreadPool, ThreadPoolArgs, WorkContext, WorkStats};
pub use errors::{BlockError, CallError};
pub use registry::Callable;
pub use traits::BlockLogic;
