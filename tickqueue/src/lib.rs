// SPDX-License-Identifier: MIT
// tickqueue: bounded-concurrency task queue for single-threaded loops
//
// - Runs handlers for pushed values with at most N in flight.
// - Pull mode asks a producer for more work when a slot is free.
// - Close drains in-flight work and then fires one completion callback.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod dispatch;
pub mod host_loop;

pub use crate::dispatch::builder::QueueBuilder;
pub use crate::dispatch::callback::Callback;
pub use crate::dispatch::engine::{QueuePhase, QueueStats};
pub use crate::dispatch::error::QueueError;
pub use crate::dispatch::options::QueueOptions;
pub use crate::dispatch::queue::Queue;
pub use crate::dispatch::task::Task;
pub use crate::host_loop::loop_thread::LoopThread;
pub use crate::host_loop::tick_loop::TickLoop;
pub use crate::host_loop::HostLoop;
