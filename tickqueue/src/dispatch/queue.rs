// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use log::{debug, error, warn};

use crate::dispatch::builder::QueueBuilder;
use crate::dispatch::callback::Callback;
use crate::dispatch::engine::{Engine, QueuePhase, QueueStats, Step};
use crate::dispatch::error::QueueError;
use crate::dispatch::options::{validate_concurrency, QueueOptions};
use crate::dispatch::task::Task;
use crate::host_loop::HostLoop;

pub(crate) type Handler<T> = Rc<dyn Fn(&T, Task<T>)>;

/// Bounded-concurrency queue attached to a host loop.
///
/// `Queue` is a cheap handle; clones refer to the same queue. Every call that
/// changes state must happen on the host loop's thread.
pub struct Queue<T> {
    shared: Rc<Shared<T>>,
}

struct Shared<T> {
    host: Rc<dyn HostLoop>,
    engine: RefCell<Engine<T>>,
    handler: Handler<T>,
    on_done: RefCell<Option<Callback<T>>>,
    on_empty: RefCell<Option<Callback<T>>>,
    trace_panics: bool,
}

impl<T: 'static> Queue<T> {
    pub fn builder(host: impl HostLoop + 'static) -> QueueBuilder<T> {
        QueueBuilder::new(Rc::new(host))
    }

    /// Shorthand for the common case of a handler, an optional completion
    /// callback and plain options.
    pub fn new(
        host: impl HostLoop + 'static,
        handler: impl Fn(&T, Task<T>) + 'static,
        on_done: Option<Callback<T>>,
        options: QueueOptions,
    ) -> Result<Self, QueueError> {
        let mut builder = Self::builder(host).handler(handler).options(options);
        if let Some(on_done) = on_done {
            builder = builder.on_done(on_done);
        }
        builder.build()
    }

    pub(crate) fn from_parts(
        host: Rc<dyn HostLoop>,
        handler: Handler<T>,
        on_done: Option<Callback<T>>,
        on_empty: Option<Callback<T>>,
        concurrency: usize,
        trace_panics: bool,
    ) -> Self {
        let has_pull = on_empty.is_some();
        let queue = Self {
            shared: Rc::new(Shared {
                host,
                engine: RefCell::new(Engine::new(concurrency)),
                handler,
                on_done: RefCell::new(on_done),
                on_empty: RefCell::new(on_empty),
                trace_panics,
            }),
        };
        if has_pull {
            queue.schedule_evaluation();
        }
        queue
    }

    /// Buffer `value` for dispatch. The handler always runs on a later tick.
    pub fn push(&self, value: T) -> Result<(), QueueError> {
        self.ensure_on_loop()?;
        let accepted = self.shared.engine.borrow_mut().enqueue(value);
        if let Err(e) = accepted {
            warn!("Rejected push: {e}");
            return Err(e);
        }
        self.schedule_evaluation();
        Ok(())
    }

    /// Change the number of handlers allowed in flight. Shrinking never
    /// preempts running handlers; it only throttles later dispatches.
    pub fn set_concurrency(&self, concurrency: usize) -> Result<(), QueueError> {
        self.ensure_on_loop()?;
        validate_concurrency(concurrency)?;
        let grew = self.shared.engine.borrow_mut().set_limit(concurrency);
        debug!("Concurrency set to {concurrency}");
        if grew {
            self.schedule_evaluation();
        }
        Ok(())
    }

    /// Install or replace the pull callback. Outstanding invitations are
    /// forgotten.
    pub fn register_pull_callback(&self, callback: Callback<T>) -> Result<(), QueueError> {
        self.ensure_on_loop()?;
        *self.shared.on_empty.borrow_mut() = Some(callback);
        self.shared.engine.borrow_mut().reset_pull_budget();
        self.schedule_evaluation();
        Ok(())
    }

    /// Stop accepting values. Buffered and in-flight work still drains, then
    /// the completion callback fires once.
    pub fn close(&self) -> Result<(), QueueError> {
        self.ensure_on_loop()?;
        if self.shared.engine.borrow_mut().close() {
            debug!("Queue closed, draining");
        }
        self.schedule_evaluation();
        Ok(())
    }

    /// Re-open a closed queue for a new completion lifecycle. A completion
    /// callback of the previous lifecycle that has not fired yet is dropped.
    /// On an open queue this only schedules an evaluation.
    pub fn run(&self) -> Result<(), QueueError> {
        self.ensure_on_loop()?;
        if self.shared.engine.borrow_mut().reopen() {
            debug!("Queue re-opened");
        }
        self.schedule_evaluation();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.shared.engine.borrow().is_closed()
    }

    pub fn concurrency(&self) -> usize {
        self.shared.engine.borrow().limit()
    }

    pub fn phase(&self) -> QueuePhase {
        self.shared.engine.borrow().phase()
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.engine.borrow().stats()
    }

    fn ensure_on_loop(&self) -> Result<(), QueueError> {
        if self.shared.host.on_own_thread() {
            Ok(())
        } else {
            Err(QueueError::NotOnLoop)
        }
    }

    /// Called by a task that has just moved to its done state.
    pub(crate) fn task_finished(&self, id: u64) {
        let queue = self.clone();
        self.shared.host.defer_next(Box::new(move || {
            queue.shared.engine.borrow_mut().complete();
            debug!("Task {id} completed");
            queue.schedule_evaluation();
        }));
    }

    fn schedule_evaluation(&self) {
        let requested = self.shared.engine.borrow_mut().request_evaluation();
        if requested {
            let queue = self.clone();
            self.shared
                .host
                .defer_next(Box::new(move || queue.evaluate()));
        }
    }

    // No engine borrow may be held while user code runs: handlers and
    // callbacks call back into push/close.
    fn evaluate(&self) {
        let can_pull = self.shared.on_empty.borrow().is_some();
        let step = self.shared.engine.borrow_mut().step(can_pull);

        match step {
            Step::Dispatch { id, value, again } => {
                let queue = self.clone();
                self.shared
                    .host
                    .defer_next(Box::new(move || queue.invoke(id, value)));
                if again {
                    self.schedule_evaluation();
                }
            }
            Step::Invite { again } => {
                if again {
                    self.schedule_evaluation();
                }
                let callback = self.shared.on_empty.borrow().clone();
                if let Some(callback) = callback {
                    debug!("Inviting producer to push");
                    callback.call(self);
                }
            }
            Step::Finish { lifecycle } => {
                debug!("Queue drained");
                let queue = self.clone();
                self.shared
                    .host
                    .defer_next(Box::new(move || queue.fire_done(lifecycle)));
            }
            Step::Idle => {}
        }
    }

    fn invoke(&self, id: u64, value: T) {
        let value = Rc::new(value);
        let task = Task::new(id, Rc::clone(&value), self.clone());
        debug!("Dispatching task {id}");
        let handler = Rc::clone(&self.shared.handler);

        if !self.shared.trace_panics {
            handler(&value, task);
            return;
        }
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| handler(&value, task))) {
            error!("Handler for task {id} panicked, its slot stays occupied");
            panic::resume_unwind(panic);
        }
    }

    fn fire_done(&self, lifecycle: u64) {
        // run() may have re-opened the queue since the finish was decided
        if !self.shared.engine.borrow().has_finished(lifecycle) {
            debug!("Completion of lifecycle {lifecycle} superseded, not firing");
            return;
        }
        let callback = self.shared.on_done.borrow().clone();
        if let Some(callback) = callback {
            callback.call(self);
        }
    }
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = self.shared.engine.borrow();
        f.debug_struct("Queue")
            .field("phase", &engine.phase())
            .field("stats", &engine.stats())
            .finish()
    }
}
