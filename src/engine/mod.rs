// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Block execution: the public [`Block`] handle, its worker actor, and the
//! thread pools actors are scheduled on.
//!
//! # Execution model
//!
//! Every block is driven by exactly one worker actor, a tokio task spawned on
//! the block's [`ThreadPool`]. The block handle talks to its actor only
//! through an unbounded mailbox:
//!
//! * configuration messages (port allocation, callable registration) are
//!   fire-and-forget and ordered before anything sent afterwards
//! * calls, stats queries and activation changes carry a one-shot reply the
//!   caller blocks on
//! * rebinding to another pool hands the actor's state to a replacement
//!   actor through the same mailbox
//!
//! Signals bypass the mailbox entirely: emitting one posts a message to the
//! signal's output port, which pushes it onto every connected slot input and
//! wakes the receiving blocks' actors.

mod actor;
mod block;
pub mod context;
mod messages;
mod reply;
pub mod stats;
pub mod thread_pool;

pub use block::Block;
pub use context::WorkContext;
pub use stats::WorkStats;
pub use thread_pool::{ThreadPool, ThreadPoolArgs};
