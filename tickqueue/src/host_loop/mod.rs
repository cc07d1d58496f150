// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

//! The two primitives a queue needs from the loop it runs on, and two loops
//! that provide them.
//!
//! - [`tick_loop::TickLoop`] is a deterministic, single-threaded loop. Tests and
//!   the demo drive it turn by turn.
//! - [`loop_thread::LoopThread`] runs a `TickLoop` on a dedicated thread and
//!   accepts work posted from other threads over a channel.

use std::rc::Rc;

pub mod loop_thread;
pub mod tick_loop;

/// The scheduler a queue is attached to.
///
/// Implementations must run deferred callbacks one at a time, strictly in the
/// order they were deferred, and never on the stack of the caller of
/// [`HostLoop::defer_next`].
pub trait HostLoop {
    /// Schedule `f` to run once, after the current tick.
    fn defer_next(&self, f: Box<dyn FnOnce()>);

    /// True iff the caller runs on the loop's own worker thread.
    fn on_own_thread(&self) -> bool;
}

impl<L: HostLoop + ?Sized> HostLoop for Rc<L> {
    fn defer_next(&self, f: Box<dyn FnOnce()>) {
        (**self).defer_next(f)
    }

    fn on_own_thread(&self) -> bool {
        (**self).on_own_thread()
    }
}
