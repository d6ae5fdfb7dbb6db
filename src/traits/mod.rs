// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod block_logic;
pub mod buffer_manager;

pub use block_logic::BlockLogic;
pub use buffer_manager::{BufferManager, BufferManagerArgs};
