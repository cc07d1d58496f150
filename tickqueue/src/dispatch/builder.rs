// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::rc::Rc;

use crate::dispatch::callback::Callback;
use crate::dispatch::error::QueueError;
use crate::dispatch::options::QueueOptions;
use crate::dispatch::queue::{Handler, Queue};
use crate::dispatch::task::Task;
use crate::host_loop::HostLoop;

pub struct QueueBuilder<T> {
    host: Rc<dyn HostLoop>,
    handler: Option<Handler<T>>,
    on_done: Option<Callback<T>>,
    on_empty: Option<Callback<T>>,
    options: QueueOptions,
    trace_panics: bool,
}

impl<T: 'static> QueueBuilder<T> {
    pub(crate) fn new(host: Rc<dyn HostLoop>) -> Self {
        Self {
            host,
            handler: None,
            on_done: None,
            on_empty: None,
            options: QueueOptions::default(),
            trace_panics: false,
        }
    }

    /// The per-value handler. It must eventually call
    /// [`Task::signal_done`] on the task it receives. The value stays
    /// reachable through [`Task::value`] until then.
    pub fn handler(mut self, handler: impl Fn(&T, Task<T>) + 'static) -> Self {
        self.handler = Some(Rc::new(handler));
        self
    }

    /// Fired once per lifecycle, after `close` and once all work has drained.
    pub fn on_done(mut self, callback: Callback<T>) -> Self {
        self.on_done = Some(callback);
        self
    }

    /// Pull callback, invited whenever a slot is free and nothing is buffered.
    pub fn on_empty(mut self, callback: Callback<T>) -> Self {
        self.on_empty = Some(callback);
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency;
        self
    }

    pub fn options(mut self, options: QueueOptions) -> Self {
        self.options = options;
        self
    }

    /// Log handler panics before letting them unwind into the host loop.
    pub fn trace_panics(mut self, enabled: bool) -> Self {
        self.trace_panics = enabled;
        self
    }

    pub fn build(self) -> Result<Queue<T>, QueueError> {
        let handler = self.handler.ok_or_else(|| {
            QueueError::InvalidArgument("a queue needs a handler".to_string())
        })?;
        self.options.validate()?;

        Ok(Queue::from_parts(
            self.host,
            handler,
            self.on_done,
            self.on_empty,
            self.options.concurrency,
            self.trace_panics,
        ))
    }
}
