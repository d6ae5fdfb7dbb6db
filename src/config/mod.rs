// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod affinity;
mod loader;

pub mod consts;

pub use affinity::AffinityZones;
pub use loader::{load_config, EngineConfig};
