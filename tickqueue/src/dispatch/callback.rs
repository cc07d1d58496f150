// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fmt;
use std::rc::Rc;

use crate::dispatch::queue::Queue;

/// A completion or pull callback. The arity is fixed when the callback is
/// built, so invocation never has to inspect it.
pub enum Callback<T> {
    NoArg(Rc<dyn Fn()>),
    /// Receives the queue, so a producer can push back into it.
    WithQueue(Rc<dyn Fn(&Queue<T>)>),
}

impl<T> Callback<T> {
    pub fn no_arg(f: impl Fn() + 'static) -> Self {
        Callback::NoArg(Rc::new(f))
    }

    pub fn with_queue(f: impl Fn(&Queue<T>) + 'static) -> Self {
        Callback::WithQueue(Rc::new(f))
    }

    pub(crate) fn call(&self, queue: &Queue<T>) {
        match self {
            Callback::NoArg(f) => f(),
            Callback::WithQueue(f) => f(queue),
        }
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Callback::NoArg(f) => Callback::NoArg(Rc::clone(f)),
            Callback::WithQueue(f) => Callback::WithQueue(Rc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::NoArg(_) => f.write_str("Callback::NoArg"),
            Callback::WithQueue(_) => f.write_str("Callback::WithQueue"),
        }
    }
}
