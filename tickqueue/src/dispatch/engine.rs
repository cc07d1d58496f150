// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::collections::VecDeque;

use serde::Serialize;

use crate::dispatch::error::QueueError;

/// Where a queue is in its lifecycle.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
pub enum QueuePhase {
    /// Open, with buffered values waiting for a slot.
    OpenDraining,
    /// Open with an empty backlog. Pull invitations may go out.
    OpenIdle,
    /// Closed, still draining in-flight or buffered work.
    Closing,
    /// Closed and drained; the completion callback has been scheduled.
    Finished,
}

/// A snapshot of the engine's counters.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub backlog: usize,
    pub concurrency: usize,
    pub outstanding_invitations: usize,
    pub dispatched: u64,
    pub completed: u64,
}

/// The unit of work one evaluation decided on.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step<T> {
    /// A slot was reserved for `value`; its handler has to be invoked.
    Dispatch { id: u64, value: T, again: bool },
    /// The pull callback has to be invoked once.
    Invite { again: bool },
    /// The queue is closed and drained; fire the completion callback of
    /// `lifecycle`.
    Finish { lifecycle: u64 },
    Idle,
}

/// Admission state of one queue. It performs no I/O and calls no user code;
/// the queue turns each [`Step`] into scheduled callbacks.
#[derive(Debug)]
pub(crate) struct Engine<T> {
    backlog: VecDeque<T>,
    pending: usize,
    limit: usize,
    closed: bool,
    finished: bool,
    pull_budget: usize,
    lifecycle: u64,
    evaluation_scheduled: bool,
    next_task_id: u64,
    dispatched: u64,
    completed: u64,
}

impl<T> Engine<T> {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            backlog: VecDeque::new(),
            pending: 0,
            limit,
            closed: false,
            finished: false,
            pull_budget: 0,
            lifecycle: 0,
            evaluation_scheduled: false,
            next_task_id: 0,
            dispatched: 0,
            completed: 0,
        }
    }

    /// Buffer a value. A push answers one outstanding pull invitation.
    pub(crate) fn enqueue(&mut self, value: T) -> Result<(), QueueError> {
        if self.closed {
            return Err(QueueError::QueueClosed);
        }
        self.pull_budget = self.pull_budget.saturating_sub(1);
        self.backlog.push_back(value);
        Ok(())
    }

    /// Returns true if the limit grew.
    pub(crate) fn set_limit(&mut self, limit: usize) -> bool {
        let grew = limit > self.limit;
        self.limit = limit;
        grew
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit
    }

    /// Returns true if the queue was open before.
    pub(crate) fn close(&mut self) -> bool {
        let was_open = !self.closed;
        self.closed = true;
        was_open
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Start a fresh completion lifecycle. An open queue keeps its lifecycle
    /// and its outstanding invitations. Returns true if the queue was closed.
    pub(crate) fn reopen(&mut self) -> bool {
        if !self.closed {
            return false;
        }
        self.closed = false;
        self.finished = false;
        self.pull_budget = 0;
        self.lifecycle += 1;
        true
    }

    /// True while `lifecycle` is the current one and it has finished.
    pub(crate) fn has_finished(&self, lifecycle: u64) -> bool {
        self.closed && self.finished && self.lifecycle == lifecycle
    }

    pub(crate) fn reset_pull_budget(&mut self) {
        self.pull_budget = 0;
    }

    pub(crate) fn complete(&mut self) {
        debug_assert!(self.pending > 0, "completion without a pending task");
        self.pending = self.pending.saturating_sub(1);
        self.completed += 1;
    }

    /// Returns true if the caller has to schedule an evaluation. At most one
    /// evaluation is outstanding at any time.
    pub(crate) fn request_evaluation(&mut self) -> bool {
        if self.evaluation_scheduled {
            return false;
        }
        self.evaluation_scheduled = true;
        true
    }

    /// One evaluation pass: perform at most one unit of work.
    pub(crate) fn step(&mut self, can_pull: bool) -> Step<T> {
        self.evaluation_scheduled = false;

        if self.pending < self.limit {
            if let Some(value) = self.backlog.pop_front() {
                self.pending += 1;
                self.dispatched += 1;
                let id = self.next_task_id;
                self.next_task_id += 1;
                let again = self.has_work(can_pull);
                return Step::Dispatch { id, value, again };
            }
        }

        if self.may_invite(can_pull) {
            self.pull_budget += 1;
            let again = self.has_work(can_pull);
            return Step::Invite { again };
        }

        if self.may_finish() {
            self.finished = true;
            return Step::Finish {
                lifecycle: self.lifecycle,
            };
        }

        Step::Idle
    }

    fn may_invite(&self, can_pull: bool) -> bool {
        can_pull
            && !self.closed
            && self.backlog.is_empty()
            && self.pending + self.pull_budget < self.limit
    }

    fn may_finish(&self) -> bool {
        self.closed && !self.finished && self.pending == 0 && self.backlog.is_empty()
    }

    fn has_work(&self, can_pull: bool) -> bool {
        (self.pending < self.limit && !self.backlog.is_empty())
            || self.may_invite(can_pull)
            || self.may_finish()
    }

    pub(crate) fn phase(&self) -> QueuePhase {
        match (self.closed, self.finished) {
            (true, true) => QueuePhase::Finished,
            (true, false) => QueuePhase::Closing,
            (false, _) if self.backlog.is_empty() => QueuePhase::OpenIdle,
            (false, _) => QueuePhase::OpenDraining,
        }
    }

    pub(crate) fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.pending,
            backlog: self.backlog.len(),
            concurrency: self.limit,
            outstanding_invitations: self.pull_budget,
            dispatched: self.dispatched,
            completed: self.completed,
        }
    }
}
