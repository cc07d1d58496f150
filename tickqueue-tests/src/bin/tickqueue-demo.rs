// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use tickqueue::QueueOptions;
use tickqueue_tests::scenario::{run_scenario, Mode, Scenario};

#[derive(Debug, Parser)]
#[command(author, version, about = "Drive a tickqueue through a scenario on a deterministic loop")]
struct Args {
    /// How values reach the queue
    #[arg(long, value_enum, default_value_t)]
    mode: Mode,

    /// Number of values to process
    #[arg(long, default_value_t = 100)]
    items: u32,

    /// Initial concurrency limit
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Queue options as JSON. Overrides --concurrency.
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Concurrency limit after the raise (resize mode)
    #[arg(long, default_value_t = 4)]
    raise_to: usize,

    /// Turns before the raise (resize mode)
    #[arg(long, default_value_t = 15)]
    raise_after: u64,

    /// Turns each handler holds its task before signalling
    #[arg(long, default_value_t = 10)]
    hold_ticks: u64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn load_options(args: &Args) -> anyhow::Result<QueueOptions> {
    let options = match &args.options {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid queue options in {}", path.display()))?
        }
        None => QueueOptions::with_concurrency(args.concurrency),
    };
    options.validate()?;
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.mode == Mode::Resize && args.raise_to == 0 {
        bail!("--raise-to must be a positive integer");
    }

    let scenario = Scenario {
        mode: args.mode,
        items: args.items,
        options: load_options(&args)?,
        raise_to: args.raise_to,
        raise_after: args.raise_after,
        hold_ticks: args.hold_ticks,
    };
    info!("Running {:?}", scenario);

    let report = run_scenario(&scenario)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("processed:     {}", report.processed.len());
        println!("max in flight: {}", report.max_in_flight);
        println!("completions:   {}", report.completions);
        println!("invitations:   {}", report.invitations);
        println!("ticks:         {}", report.ticks);
    }
    Ok(())
}
