// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::warn;

use crate::dispatch::error::QueueError;
use crate::dispatch::queue::Queue;

enum TaskState<T> {
    Active { value: Rc<T>, master: Queue<T> },
    Done,
}

/// One-shot completion token handed to the handler with each value.
///
/// Clones share the same state, so the handler may move a clone into a timer
/// or a channel. Exactly one [`Task::signal_done`] is accepted across all of
/// them.
pub struct Task<T> {
    inner: Rc<TaskInner<T>>,
}

struct TaskInner<T> {
    id: u64,
    state: RefCell<TaskState<T>>,
}

impl<T: 'static> Task<T> {
    pub(crate) fn new(id: u64, value: Rc<T>, master: Queue<T>) -> Self {
        Self {
            inner: Rc::new(TaskInner {
                id,
                state: RefCell::new(TaskState::Active { value, master }),
            }),
        }
    }

    /// Dispatch sequence number, unique within the owning queue.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_done(&self) -> bool {
        matches!(*self.inner.state.borrow(), TaskState::Done)
    }

    /// The carried value, or `None` once the task is done. The returned
    /// handle does not borrow the task, so it may outlive `signal_done`.
    pub fn value(&self) -> Option<Rc<T>> {
        match &*self.inner.state.borrow() {
            TaskState::Active { value, .. } => Some(Rc::clone(value)),
            TaskState::Done => None,
        }
    }

    /// Release this task's slot. The task's reference to the value and the
    /// back-reference to the queue are dropped here.
    pub fn signal_done(&self) -> Result<(), QueueError> {
        match self.inner.state.replace(TaskState::Done) {
            TaskState::Active { value, master } => {
                drop(value);
                master.task_finished(self.inner.id);
                Ok(())
            }
            TaskState::Done => {
                warn!("Task {} signalled completion twice", self.inner.id);
                Err(QueueError::AlreadyDone)
            }
        }
    }
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let done = matches!(*self.inner.state.borrow(), TaskState::Done);
        f.debug_struct("Task")
            .field("id", &self.inner.id)
            .field("done", &done)
            .finish()
    }
}
