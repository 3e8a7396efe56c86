//! Background worker for periodic and on-demand tasks.
//!
//! A `BackgroundWorker<R>` owns one dedicated OS thread driving a
//! single-threaded tokio runtime. Tasks arrive over an mpsc channel and a
//! `BackgroundRunnable` processes them, with a periodic tick callback.
//! Nothing on the worker thread is shared with callers except through the
//! runnable's own state.

use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// BackgroundRunnable trait
// ---------------------------------------------------------------------------

/// Trait for task handlers executed by `BackgroundWorker`.
#[async_trait]
pub trait BackgroundRunnable: Send + 'static {
    /// The type of task this runnable processes.
    type Task: Send + 'static;

    /// Process a single task.
    async fn run(&mut self, task: Self::Task);

    /// Called on each tick interval. Default is a no-op.
    async fn on_tick(&mut self) {}

    /// Called once when the worker is shutting down. Default is a no-op.
    async fn shutdown(&mut self) {}
}

// ---------------------------------------------------------------------------
// BackgroundWorker
// ---------------------------------------------------------------------------

/// Handle to a background worker thread.
///
/// The first tick fires one full interval after start. Dropping the handle
/// stops the worker and joins its thread.
pub struct BackgroundWorker<R: BackgroundRunnable> {
    tx: Option<mpsc::Sender<R::Task>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl<R: BackgroundRunnable> BackgroundWorker<R> {
    /// Start the worker on a new thread named `thread_name`.
    ///
    /// The channel capacity is fixed at 256.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime or the thread cannot be created.
    pub fn start(
        mut runnable: R,
        tick_interval: Duration,
        thread_name: &str,
    ) -> std::io::Result<Self> {
        let (tx, mut rx) = mpsc::channel::<R::Task>(256);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let handle = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut tick_interval = tokio::time::interval(tick_interval);
                    // Skip the first immediate tick so on_tick doesn't fire at startup.
                    tick_interval.tick().await;

                    loop {
                        tokio::select! {
                            task = rx.recv() => {
                                match task {
                                    Some(t) => runnable.run(t).await,
                                    None => break, // Channel closed.
                                }
                            }
                            _ = tick_interval.tick() => {
                                runnable.on_tick().await;
                            }
                            _ = &mut shutdown_rx => {
                                break;
                            }
                        }
                    }

                    runnable.shutdown().await;
                });
            })?;

        debug!(thread = thread_name, "background worker started");

        Ok(Self {
            tx: Some(tx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Submit a task to the worker without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has been stopped or the channel is full.
    pub fn submit(&self, task: R::Task) -> anyhow::Result<()> {
        match &self.tx {
            Some(tx) => tx
                .try_send(task)
                .map_err(|e| anyhow::anyhow!("worker channel unavailable: {e}")),
            None => Err(anyhow::anyhow!("worker not running")),
        }
    }

    /// `false` once stopped, or once the worker thread has exited on its own
    /// (for example after the runnable panicked).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the worker and wait for its thread to finish. A panic on the
    /// worker thread is logged, not propagated.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let thread = handle.thread().name().unwrap_or("<unnamed>").to_string();
            if let Err(payload) = handle.join() {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(thread = %thread, reason = %reason, "background worker panicked");
            }
        }
    }
}

impl<R: BackgroundRunnable> Drop for BackgroundWorker<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
