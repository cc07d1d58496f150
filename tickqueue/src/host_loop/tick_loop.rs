// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::thread::{self, ThreadId};

use crate::host_loop::HostLoop;

type Deferred = Box<dyn FnOnce()>;

/// A deterministic single-threaded loop.
///
/// Each [`TickLoop::turn`] advances the tick counter by one, runs the callbacks
/// that were ready when the turn started and then fires the timers due on the
/// new tick. Anything deferred while a turn is running waits for the next turn.
#[derive(Clone)]
pub struct TickLoop {
    inner: Rc<Inner>,
}

struct Inner {
    owner: ThreadId,
    tick: Cell<u64>,
    ready: RefCell<VecDeque<Deferred>>,
    // keyed by (due tick, insertion sequence) so equal deadlines keep FIFO order
    timers: RefCell<BTreeMap<(u64, u64), Deferred>>,
    timer_seq: Cell<u64>,
}

impl TickLoop {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                owner: thread::current().id(),
                tick: Cell::new(0),
                ready: RefCell::new(VecDeque::new()),
                timers: RefCell::new(BTreeMap::new()),
                timer_seq: Cell::new(0),
            }),
        }
    }

    /// The number of turns run so far.
    pub fn tick(&self) -> u64 {
        self.inner.tick.get()
    }

    /// Run `f` once `ticks` turns from now. A delay of 0 is treated as 1.
    pub fn defer_after(&self, ticks: u64, f: impl FnOnce() + 'static) {
        let due = self.tick() + ticks.max(1);
        let seq = self.inner.timer_seq.get();
        self.inner.timer_seq.set(seq + 1);
        self.inner
            .timers
            .borrow_mut()
            .insert((due, seq), Box::new(f));
    }

    pub fn is_idle(&self) -> bool {
        self.inner.ready.borrow().is_empty() && self.inner.timers.borrow().is_empty()
    }

    /// Run one turn and return how many callbacks ran.
    pub fn turn(&self) -> usize {
        let tick = self.tick() + 1;
        self.inner.tick.set(tick);

        let batch = self.inner.ready.borrow().len();
        let mut ran = 0;
        for _ in 0..batch {
            let next = self.inner.ready.borrow_mut().pop_front();
            match next {
                Some(callback) => {
                    callback();
                    ran += 1;
                }
                None => break,
            }
        }

        loop {
            let due = {
                let mut timers = self.inner.timers.borrow_mut();
                let next_due = timers.first_key_value().map(|(&(at, _), _)| at);
                if next_due.is_some_and(|at| at <= tick) {
                    timers.pop_first()
                } else {
                    None
                }
            };
            match due {
                Some((_, callback)) => {
                    callback();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    /// Turn until nothing is ready and no timer is pending. Returns the number
    /// of turns taken.
    pub fn run(&self) -> u64 {
        let start = self.tick();
        while !self.is_idle() {
            self.turn();
        }
        self.tick() - start
    }

    /// Turn at most `turns` times, stopping early when idle.
    pub fn run_turns(&self, turns: u64) -> u64 {
        let start = self.tick();
        for _ in 0..turns {
            if self.is_idle() {
                break;
            }
            self.turn();
        }
        self.tick() - start
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLoop for TickLoop {
    fn defer_next(&self, f: Box<dyn FnOnce()>) {
        self.inner.ready.borrow_mut().push_back(f);
    }

    fn on_own_thread(&self) -> bool {
        thread::current().id() == self.inner.owner
    }
}

impl fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickLoop")
            .field("tick", &self.tick())
            .field("ready", &self.inner.ready.borrow().len())
            .field("timers", &self.inner.timers.borrow().len())
            .finish()
    }
}
