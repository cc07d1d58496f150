// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use clap::ValueEnum;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tickqueue::QueueOptions;

use crate::probe::{Probe, ProbeReport};

/// How values reach the queue.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    /// Push every value up front, then close
    Push,
    /// Let the queue pull values from a producer, which closes when exhausted
    Pull,
    /// Push every value, then raise the concurrency limit mid-flight
    Resize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub mode: Mode,
    pub items: u32,
    pub options: QueueOptions,
    /// Only used by [`Mode::Resize`].
    pub raise_to: usize,
    /// Only used by [`Mode::Resize`].
    pub raise_after: u64,
    pub hold_ticks: u64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            mode: Mode::Push,
            items: 100,
            options: QueueOptions::default(),
            raise_to: 4,
            raise_after: 15,
            hold_ticks: 10,
        }
    }
}

pub fn run_scenario(scenario: &Scenario) -> anyhow::Result<ProbeReport> {
    let probe = Probe::new();
    let queue = probe.queue(scenario.options, scenario.hold_ticks)?;

    match scenario.mode {
        Mode::Push => {
            for v in 0..scenario.items {
                queue.push(v)?;
            }
            queue.close()?;
        }
        Mode::Pull => {
            queue.register_pull_callback(probe.pull_from(scenario.items))?;
        }
        Mode::Resize => {
            for v in 0..scenario.items {
                queue.push(v)?;
            }
            let resized = queue.clone();
            let raise_to = scenario.raise_to;
            probe.host().defer_after(scenario.raise_after, move || {
                if let Err(e) = resized.set_concurrency(raise_to) {
                    warn!("Could not raise concurrency to {raise_to}: {e}");
                }
            });
            queue.close()?;
        }
    }

    let turns = probe.run();
    info!(
        "Scenario {:?} finished after {turns} turns in phase {:?}",
        scenario.mode,
        queue.phase()
    );
    Ok(probe.report())
}
