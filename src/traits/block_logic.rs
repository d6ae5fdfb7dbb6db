// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::engine::WorkContext;
use crate::traits::BufferManager;

/// The behavior of a block, driven by its worker actor.
///
/// Every hook runs inside the actor, serialized with the block's mailbox,
/// so implementations own their state without locks. All hooks default to
/// no-ops; a block only overrides what it needs.
///
/// ```
/// use the_blockflow::engine::WorkContext;
/// use the_blockflow::traits::BlockLogic;
///
/// struct Passthrough;
///
/// impl BlockLogic for Passthrough {
///     fn work(&mut self, ctx: &mut WorkContext<'_, Self>) -> anyhow::Result<()> {
///         ctx.propagate_labels("in0");
///         Ok(())
///     }
/// }
/// ```
pub trait BlockLogic: Send + Sized + 'static {
    /// One iteration of the work loop. Only called while the block is active.
    ///
    /// Input labels queued when the cycle starts are dropped once it returns,
    /// whether or not the logic looked at them. Forward them with
    /// [`WorkContext::propagate_labels`] or keep them with `take_labels`.
    fn work(&mut self, _ctx: &mut WorkContext<'_, Self>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when the block transitions to active, before the first work call.
    fn activate(&mut self, _ctx: &mut WorkContext<'_, Self>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when the block transitions to inactive, after the last work call.
    fn deactivate(&mut self, _ctx: &mut WorkContext<'_, Self>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Buffer manager this block wants for input `name` under `domain`.
    ///
    /// `None` abdicates the choice to the connection resolver.
    fn input_buffer_manager(&mut self, _name: &str, _domain: &str) -> Option<Arc<dyn BufferManager>> {
        None
    }

    /// Buffer manager this block wants for output `name` under `domain`.
    fn output_buffer_manager(&mut self, _name: &str, _domain: &str) -> Option<Arc<dyn BufferManager>> {
        None
    }
}
