// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

use crate::config::EngineConfig;
use crate::engine::{ThreadPool, ThreadPoolArgs};
use crate::errors::{BlockError, ConfigError};

/// Named thread pools that blocks can be grouped onto.
///
/// Pools are built on first request and cached, so every block asking for
/// the same zone shares one pool. The empty zone name clears affinity: it
/// resolves to the process-wide default pool, or to a pool built from the
/// configured default layout when one is given.
#[derive(Debug)]
pub struct AffinityZones {
    default_pool: ThreadPoolArgs,
    zones: BTreeMap<String, ThreadPoolArgs>,
    pools: Mutex<HashMap<String, ThreadPool>>,
}

impl AffinityZones {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            default_pool: config.default_pool.clone(),
            zones: config.affinity_zones.clone(),
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Configured zone names, sorted. The empty zone is not listed.
    pub fn names(&self) -> Vec<&str> {
        self.zones.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, zone: &str) -> bool {
        zone.is_empty() || self.zones.contains_key(zone)
    }

    /// The pool for `zone`, building it on first use.
    pub fn pool(&self, zone: &str) -> Result<ThreadPool, BlockError> {
        let args = if zone.is_empty() {
            if self.default_pool == ThreadPoolArgs::default() {
                return Ok(ThreadPool::global()?);
            }
            &self.default_pool
        } else {
            self.zones
                .get(zone)
                .ok_or_else(|| ConfigError::UnknownAffinityZone { zone: zone.to_string() })?
        };

        let mut pools = self.pools.lock();
        if let Some(pool) = pools.get(zone) {
            return Ok(pool.clone());
        }
        let mut args = args.clone();
        if args.thread_name.is_none() && !zone.is_empty() {
            args.thread_name = Some(format!("zone-{}", zone));
        }
        let pool = ThreadPool::new(args)?;
        pools.insert(zone.to_string(), pool.clone());
        Ok(pool)
    }

    /// Drop cached pools; blocks already bound keep theirs alive.
    pub fn clear(&self) {
        self.pools.lock().clear();
    }
}
