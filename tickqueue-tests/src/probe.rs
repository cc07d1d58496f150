// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;
use serde::{Deserialize, Serialize};
use tickqueue::{Callback, Queue, QueueError, QueueOptions, Task, TickLoop};

/// What a probed queue did during one run.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ProbeReport {
    /// Values in the order their handlers were invoked.
    pub processed: Vec<u32>,

    pub max_in_flight: usize,

    /// How often the completion callback fired.
    pub completions: usize,

    /// How often the pull callback was invited.
    pub invitations: usize,

    pub ticks: u64,
}

#[derive(Default)]
struct ProbeState {
    processed: RefCell<Vec<u32>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
    completions: Cell<usize>,
    invitations: Cell<usize>,
}

impl ProbeState {
    fn enter(&self) {
        let now = self.in_flight.get() + 1;
        self.in_flight.set(now);
        self.max_in_flight.set(self.max_in_flight.get().max(now));
    }

    fn leave(&self) {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
    }
}

/// Instruments a queue running on its own [`TickLoop`].
pub struct Probe {
    host: TickLoop,
    state: Rc<ProbeState>,
}

impl Probe {
    pub fn new() -> Self {
        Self {
            host: TickLoop::new(),
            state: Rc::new(ProbeState::default()),
        }
    }

    pub fn host(&self) -> &TickLoop {
        &self.host
    }

    /// A handler that records its value and signals `hold_ticks` turns later.
    /// With `hold_ticks == 0` it signals before returning.
    pub fn handler(&self, hold_ticks: u64) -> impl Fn(&u32, Task<u32>) + 'static {
        let state = self.state.clone();
        let timers = self.host.clone();
        move |v: &u32, task: Task<u32>| {
            state.processed.borrow_mut().push(*v);
            state.enter();
            if hold_ticks == 0 {
                state.leave();
                signal(&task);
                return;
            }
            let state = state.clone();
            timers.defer_after(hold_ticks, move || {
                state.leave();
                signal(&task);
            });
        }
    }

    pub fn on_done(&self) -> Callback<u32> {
        let state = self.state.clone();
        Callback::no_arg(move || state.completions.set(state.completions.get() + 1))
    }

    /// A producer that answers each invitation with the next of `0..items`
    /// and closes the queue once they are used up.
    pub fn pull_from(&self, items: u32) -> Callback<u32> {
        let state = self.state.clone();
        let next = Cell::new(0u32);
        Callback::with_queue(move |queue: &Queue<u32>| {
            state.invitations.set(state.invitations.get() + 1);
            let v = next.get();
            if v < items {
                next.set(v + 1);
                if let Err(e) = queue.push(v) {
                    warn!("Producer push failed: {e}");
                }
            } else if let Err(e) = queue.close() {
                warn!("Producer close failed: {e}");
            }
        })
    }

    pub fn queue(&self, options: QueueOptions, hold_ticks: u64) -> Result<Queue<u32>, QueueError> {
        Queue::builder(self.host.clone())
            .options(options)
            .handler(self.handler(hold_ticks))
            .on_done(self.on_done())
            .build()
    }

    /// Turn the loop until idle and return the number of turns.
    pub fn run(&self) -> u64 {
        self.host.run()
    }

    pub fn report(&self) -> ProbeReport {
        ProbeReport {
            processed: self.state.processed.borrow().clone(),
            max_in_flight: self.state.max_in_flight.get(),
            completions: self.state.completions.get(),
            invitations: self.state.invitations.get(),
            ticks: self.host.tick(),
        }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::new()
    }
}

fn signal(task: &Task<u32>) {
    if let Err(e) = task.signal_done() {
        warn!("Task {} could not signal: {e}", task.id());
    }
}
