// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot of a worker actor's counters.
///
/// Counters survive thread-pool rebinding: a replacement actor adopts them
/// along with the rest of the block's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkStats {
    pub num_work_calls: u64,
    pub num_work_errors: u64,
    /// Opaque calls handled by the actor, successful or not
    pub num_calls: u64,
    pub num_call_errors: u64,
    pub num_slot_calls: u64,
    pub num_slot_errors: u64,
    pub num_activations: u64,
    pub total_time_work: Duration,
    pub max_time_work: Duration,
    pub last_time_work: Duration,
}

impl WorkStats {
    pub(crate) fn record_work(&mut self, elapsed: Duration, succeeded: bool) {
        self.num_work_calls += 1;
        if !succeeded {
            self.num_work_errors += 1;
        }
        self.total_time_work += elapsed;
        self.last_time_work = elapsed;
        self.max_time_work = self.max_time_work.max(elapsed);
    }

    pub(crate) fn record_call(&mut self, succeeded: bool) {
        self.num_calls += 1;
        if !succeeded {
            self.num_call_errors += 1;
        }
    }

    pub(crate) fn record_slot_call(&mut self, succeeded: bool) {
        self.num_slot_calls += 1;
        if !succeeded {
            self.num_slot_errors += 1;
        }
    }

    /// Average duration of one work call, zero before the first.
    pub fn mean_time_work(&self) -> Duration {
        match u32::try_from(self.num_work_calls) {
            Ok(0) => Duration::ZERO,
            Ok(calls) => self.total_time_work / calls,
            Err(_) => Duration::from_secs_f64(self.total_time_work.as_secs_f64() / self.num_work_calls as f64),
        }
    }
}
