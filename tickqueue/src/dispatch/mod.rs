// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Design: Bounded-Concurrency Queue on a Cooperative Loop
//!
//! ## Overview
//! Callers push values; each value is handed to a handler together with a
//! [`task::Task`]. At most `concurrency` tasks are in flight at once.
//!
//! - All state lives behind `Rc<RefCell<..>>` and is touched only on the host
//!   loop's thread, so there are no locks.
//! - Every trigger (push, task completion, limit increase, close, pull
//!   registration, re-open) schedules the same evaluation. At most one
//!   evaluation is scheduled at a time and each performs one unit of work.
//! - Pushes are always buffered; the handler runs on a later tick, never on the
//!   caller's stack.
//! - The pull callback is only invited while the backlog is empty, and
//!   in-flight tasks plus outstanding invitations never exceed the limit.
//! - The completion callback fires once per lifecycle, after `close` and when
//!   nothing is pending.
//!
//! ```text
//!         push / close / set_concurrency / register_pull_callback / run
//!                    |
//!                    v
//!         +----------+-----------+       next tick        +-----------+
//!         |  Queue (façade)      +----------------------->|  Engine   |
//!         +----------------------+   schedule_evaluation  |  step()   |
//!                    ^                                    +-----+-----+
//!                    |                                          |
//!                    |         Dispatch | Invite | Finish | Idle |
//!                    |                                          v
//!         +----------+-----------+                    +---------+--------+
//!         | Task::signal_done()  |<-------------------+ handler(v, task) |
//!         +----------------------+                    +------------------+
//! ```

pub mod builder;
pub mod callback;
pub mod engine;
pub mod error;
pub mod options;
pub mod queue;
pub mod task;
