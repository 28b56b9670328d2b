use crate::error::{Result, RobomuxError};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default grace period a cancelled worker gets before it is declared
/// leaked.
pub const STOP_GRACE: Duration = Duration::from_secs(2);

/// Outcome of a `Worker::stop` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was nothing to stop.
    NotRunning,
    /// The task observed its cancellation signal and exited in time.
    Stopped,
    /// The task ignored the signal past the grace period. Bookkeeping is
    /// cleared anyway; the task is assumed to exit on its own eventually.
    Leaked,
}

/// Cancellable background-task wrapper, instantiated once per long-running
/// service (chatbot, RPS game, presentation script).
///
/// `start` spawns exactly one task; `stop` cancels and joins with a bounded
/// grace period. A task that outlives its grace period is tracked so a
/// re-start is refused while it is still suspected live.
pub struct Worker {
    name: &'static str,
    grace: Duration,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
    leaked: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn new(name: &'static str) -> Self {
        Self::with_grace(name, STOP_GRACE)
    }

    pub fn with_grace(name: &'static str, grace: Duration) -> Self {
        Self {
            name,
            grace,
            cancel: None,
            handle: None,
            leaked: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the service loop if it is not already running. The factory
    /// receives a fresh cancellation token the loop must poll at every
    /// blocking point.
    pub fn start<F, Fut>(&mut self, factory: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            warn!("Worker '{}' is already running", self.name);
            return Ok(());
        }

        if let Some(leaked) = &self.leaked {
            if leaked.is_finished() {
                info!("Worker '{}': previously leaked task has exited", self.name);
                self.leaked = None;
            } else {
                return Err(RobomuxError::WorkerBusy { name: self.name });
            }
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(factory(token.clone()));
        self.cancel = Some(token);
        self.handle = Some(handle);
        info!("Worker '{}' started", self.name);
        Ok(())
    }

    /// Cancel the task and wait up to the grace period for it to exit.
    /// Bookkeeping is cleared regardless of the outcome.
    pub async fn stop(&mut self) -> StopOutcome {
        let (Some(cancel), Some(mut handle)) = (self.cancel.take(), self.handle.take()) else {
            debug!("Worker '{}' is not running", self.name);
            return StopOutcome::NotRunning;
        };

        info!("Stopping worker '{}'", self.name);
        cancel.cancel();

        match timeout(self.grace, &mut handle).await {
            Ok(Ok(())) => {
                info!("Worker '{}' stopped", self.name);
                StopOutcome::Stopped
            }
            Ok(Err(e)) => {
                error!("Worker '{}' task failed: {}", self.name, e);
                StopOutcome::Stopped
            }
            Err(_) => {
                warn!(
                    "Worker '{}' did not exit within {:?}; treating as leaked",
                    self.name, self.grace
                );
                self.leaked = Some(handle);
                StopOutcome::Leaked
            }
        }
    }
}
