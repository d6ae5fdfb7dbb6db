// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::config::consts::{DEFAULT_BUFFER_SIZE, DEFAULT_NUM_BUFFERS};

/// Allocation parameters a buffer manager was (or will be) set up with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferManagerArgs {
    pub num_buffers: usize,
    pub buffer_size: usize,
    /// NUMA node to allocate on, -1 for no preference
    pub node_affinity: i64,
}

impl Default for BufferManagerArgs {
    fn default() -> Self {
        Self {
            num_buffers: DEFAULT_NUM_BUFFERS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            node_affinity: -1,
        }
    }
}

/// An allocation policy for a port's data buffers.
///
/// Blocks return one from their buffer-manager hooks to assert how a port
/// should be fed; returning `None` leaves the choice to the connection
/// resolver. Arbitration between the two ends of a connection is not handled
/// here.
pub trait BufferManager: Send + Sync + Debug {
    /// Short name of the policy, such as `"generic"` or `"circular"`.
    fn kind(&self) -> &str;

    fn args(&self) -> &BufferManagerArgs;
}
