// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debounced single-flight execution of update cycles.
//!
//! Every scheduled value restarts the quiet period; only the last value of a
//! burst runs. Before a cycle starts, the previous one is cancelled through
//! its token and awaited, so at most one cycle touches the viewer at a time.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Handle to the debounce loop. Must be created inside a
/// [`tokio::task::LocalSet`].
pub struct UpdateScheduler<T> {
    sender: UnboundedSender<T>,
    /// Values sent but not yet started (coalesced or not).
    pending: Rc<Cell<usize>>,
    running: Rc<Cell<bool>>,
    idle: Rc<Notify>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T: 'static> UpdateScheduler<T> {
    /// Spawn the loop. `run` builds the cycle future for one value; the
    /// token it receives is cancelled when a newer value supersedes it.
    pub fn spawn<F, Fut>(delay: Duration, run: F) -> Self
    where
        F: Fn(T, CancellationToken) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Rc::new(Cell::new(0));
        let running = Rc::new(Cell::new(false));
        let idle = Rc::new(Notify::new());
        let shutdown = CancellationToken::new();
        let task = tokio::task::spawn_local(debounce_loop(
            delay,
            receiver,
            run,
            Flags {
                pending: pending.clone(),
                running: running.clone(),
                idle: idle.clone(),
            },
            shutdown.clone(),
        ));
        Self {
            sender,
            pending,
            running,
            idle,
            shutdown,
            task: Some(task),
        }
    }

    /// Queue `value`, restarting the quiet period.
    pub fn schedule(&self, value: T) {
        if self.sender.send(value).is_ok() {
            self.pending.set(self.pending.get() + 1);
        } else {
            tracing::warn!("Update scheduler stopped, dropping update");
        }
    }

    /// A value is waiting for its quiet period to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending.get() > 0
    }

    /// A cycle is running.
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Resolve once nothing is pending or running.
    pub async fn settled(&self) {
        while self.is_pending() || self.is_running() {
            self.idle.notified().await;
        }
    }

    /// Drop pending values, cancel the running cycle and wait for it.
    pub async fn shutdown(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Update scheduler task failed");
            }
        }
        self.pending.set(0);
        self.idle.notify_waiters();
    }
}

impl<T> Drop for UpdateScheduler<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Flags {
    pending: Rc<Cell<usize>>,
    running: Rc<Cell<bool>>,
    idle: Rc<Notify>,
}

async fn debounce_loop<T, F, Fut>(
    delay: Duration,
    mut receiver: UnboundedReceiver<T>,
    run: F,
    flags: Flags,
    shutdown: CancellationToken,
) where
    F: Fn(T, CancellationToken) -> Fut,
    Fut: Future<Output = ()> + 'static,
{
    let mut latest: Option<T> = None;
    let mut absorbed = 0;
    let mut in_flight: Option<(CancellationToken, JoinHandle<()>)> = None;
    let timer = sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            received = receiver.recv() => match received {
                Some(value) => {
                    latest = Some(value);
                    absorbed += 1;
                    timer.as_mut().reset(Instant::now() + delay);
                }
                None => break,
            },
            () = &mut timer, if latest.is_some() => {
                let Some(value) = latest.take() else { continue };

                if let Some((token, task)) = in_flight.take() {
                    tracing::debug!("Cancelling previous update cycle");
                    token.cancel();
                    join_cycle(task).await;
                }

                let token = CancellationToken::new();
                let cycle = run(value, token.clone());
                flags.running.set(true);
                let task = tokio::task::spawn_local(supervise(
                    cycle,
                    flags.running.clone(),
                    flags.idle.clone(),
                ));
                in_flight = Some((token, task));
                // Released only now so the cancel-and-await gap still counts
                // as pending.
                flags.pending.set(flags.pending.get().saturating_sub(absorbed));
                absorbed = 0;
            }
        }
    }

    if let Some((token, task)) = in_flight.take() {
        token.cancel();
        join_cycle(task).await;
    }
    flags.running.set(false);
    flags.idle.notify_waiters();
    tracing::debug!("Update scheduler stopped");
}

/// Run `cycle` as its own task and release the flags however it ends. A
/// panicking cycle is logged and the scheduler keeps going.
async fn supervise<Fut>(cycle: Fut, running: Rc<Cell<bool>>, idle: Rc<Notify>)
where
    Fut: Future<Output = ()> + 'static,
{
    if let Err(e) = tokio::task::spawn_local(cycle).await {
        tracing::error!(error = %e, "Update cycle failed");
    }
    running.set(false);
    idle.notify_waiters();
}

async fn join_cycle(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        tracing::warn!(error = %e, "Update cycle task failed");
    }
}
