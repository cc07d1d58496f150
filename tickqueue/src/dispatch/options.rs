// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};

use crate::dispatch::error::QueueError;

/// Plain-data queue settings. Callbacks are given to the builder separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueOptions {
    /// Maximum number of handlers in flight at once.
    pub concurrency: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl QueueOptions {
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self { concurrency }
    }

    pub fn validate(&self) -> Result<(), QueueError> {
        validate_concurrency(self.concurrency)
    }
}

pub(crate) fn validate_concurrency(concurrency: usize) -> Result<(), QueueError> {
    if concurrency == 0 {
        return Err(QueueError::InvalidArgument(
            "concurrency must be a positive integer".to_string(),
        ));
    }
    Ok(())
}
