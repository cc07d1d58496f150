// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use thiserror::Error;

/// Errors raised synchronously at the queue's public surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// `push` after `close`.
    #[error("queue is closed and no longer accepts values")]
    QueueClosed,

    /// A task signalled completion a second time. This is a handler bug.
    #[error("task has already signalled completion")]
    AlreadyDone,

    /// A side-effecting call was made off the host loop's thread.
    #[error("queue operations must run on the host loop's own thread")]
    NotOnLoop,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
