// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod block;
mod call;
mod config;
mod load;
mod resource;

pub use block::BlockError;
pub use call::CallError;
pub use config::ConfigError;
pub use load::ConfigLoadError;
pub use resource::ResourceError;
