// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Fallback thread count when available parallelism cannot be detected
pub const DEFAULT_POOL_THREADS: usize = 4;
/// Upper bound on threads a single pool may request
pub const MAX_POOL_THREADS: usize = 1024;
/// Thread name prefix for pools built without an explicit name
pub const DEFAULT_POOL_THREAD_NAME: &str = "blockflow-pool";
/// Default buffer count handed to buffer managers
pub const DEFAULT_NUM_BUFFERS: usize = 4;
/// Default buffer size in bytes handed to buffer managers
pub const DEFAULT_BUFFER_SIZE: usize = 8192;
/// Environment filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
