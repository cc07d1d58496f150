// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use anyhow::{anyhow, Context};
use async_channel::{Receiver, Sender};
use futures::executor::block_on;
use log::{debug, info, warn};
use std::thread::{self, JoinHandle};

use crate::host_loop::tick_loop::TickLoop;

/// Work posted into a loop thread. It runs on the loop's own thread with the
/// loop and the per-thread state.
pub type Work<S> = Box<dyn FnOnce(&TickLoop, &S) -> anyhow::Result<()> + Send>;

/// Runs a [`TickLoop`] on a dedicated thread.
///
/// The state `S` is built on the loop thread by the factory given to
/// [`LoopThread::spawn`], so it may hold `!Send` values such as a queue.
/// Other threads reach it only through [`LoopThread::post`].
pub struct LoopThread<S> {
    thread_handle: Option<JoinHandle<()>>,
    tx: Option<Sender<Work<S>>>,
}

impl<S: 'static> LoopThread<S> {
    pub fn spawn<F>(name: &str, setup: F) -> anyhow::Result<Self>
    where
        F: FnOnce(&TickLoop) -> anyhow::Result<S> + Send + 'static,
    {
        let (tx, rx) = async_channel::unbounded::<Work<S>>();

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let host = TickLoop::new();
                let state = match setup(&host) {
                    Ok(state) => state,
                    Err(e) => {
                        log::error!("Loop thread setup failed: {e:#}");
                        return;
                    }
                };
                drive_loop(&host, &state, rx);
            })
            .with_context(|| format!("failed to spawn loop thread {name}"))?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            tx: Some(tx),
        })
    }

    /// Hand `work` to the loop thread. Work posted while a turn is running
    /// waits for the batch taken before the following turn.
    pub fn post<F>(&self, work: F) -> anyhow::Result<()>
    where
        F: FnOnce(&TickLoop, &S) -> anyhow::Result<()> + Send + 'static,
    {
        self.tx
            .as_ref()
            .context("loop thread already closed")?
            .send_blocking(Box::new(work))
            .map_err(|_| anyhow!("loop thread has stopped"))
    }

    /// Stop accepting work. The thread finishes what was posted and what the
    /// loop still has scheduled, then exits.
    pub fn close(&mut self) {
        self.tx = None;
        debug!("Loop thread sender dropped");
    }

    pub fn wait_until_finished(&mut self) -> anyhow::Result<()> {
        self.close();
        if let Some(handle) = self.thread_handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("loop thread panicked"))?;
        }
        Ok(())
    }
}

fn drive_loop<S>(host: &TickLoop, state: &S, rx: Receiver<Work<S>>) {
    info!("Starting loop thread");
    loop {
        run_posted_batch(host, state, &rx);

        if !host.is_idle() {
            host.turn();
            continue;
        }

        match block_on(rx.recv()) {
            Ok(work) => run_work(host, state, work),
            Err(_) => break,
        }
    }

    let turns = host.run();
    info!("Loop thread ended after draining {turns} turns, channel closed");
}

/// Run the work that was already queued when the batch started. Work posted
/// meanwhile waits for the next batch, so the loop keeps turning while a
/// producer posts continuously. Returns the number of items run.
pub(crate) fn run_posted_batch<S>(host: &TickLoop, state: &S, rx: &Receiver<Work<S>>) -> usize {
    let batch = rx.len();
    let mut ran = 0;
    while ran < batch {
        match rx.try_recv() {
            Ok(work) => run_work(host, state, work),
            Err(_) => break,
        }
        ran += 1;
    }
    ran
}

fn run_work<S>(host: &TickLoop, state: &S, work: Work<S>) {
    if let Err(e) = work(host, state) {
        warn!("Posted work failed: {e:#}");
    }
}
