//! Bridge from the blocking UI thread to the worker's runtime.
//!
//! Work is spawned onto the worker runtime and the caller waits on a
//! one-slot channel with a deadline. Past the deadline the caller gives up
//! and the spawned task is left to finish on its own; whatever it sends back
//! lands in a dropped receiver.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, warn};
use wardenbot_common::models::SharedStatus;

use crate::Error;
use crate::platforms::ModerationApi;
use crate::platforms::discord::BotWorker;

pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(20);

/// What the UI shows after an action: success flag plus text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeOutcome {
    pub ok: bool,
    pub message: String,
}

impl InvokeOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(err: &Error) -> Self {
        Self {
            ok: false,
            message: err.to_string(),
        }
    }
}

impl From<Result<Option<String>, Error>> for InvokeOutcome {
    fn from(result: Result<Option<String>, Error>) -> Self {
        match result {
            Ok(message) => InvokeOutcome::success(message.unwrap_or_else(|| "OK".to_string())),
            Err(err) => InvokeOutcome::failure(&err),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Invoker {
    timeout: Duration,
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new(DEFAULT_INVOKE_TIMEOUT)
    }
}

impl Invoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `work` on the worker and blocks for at most the configured
    /// timeout.
    ///
    /// `work` is only called once the worker is alive and connected, so a
    /// refused invocation never reaches the remote API.
    pub fn invoke<F, Fut>(
        &self,
        worker: Option<&BotWorker>,
        status: &SharedStatus,
        work: F,
    ) -> InvokeOutcome
    where
        F: FnOnce(Arc<dyn ModerationApi>) -> Fut,
        Fut: Future<Output = Result<Option<String>, Error>> + Send + 'static,
    {
        self.submit(worker, status, work).into()
    }

    fn submit<F, Fut>(
        &self,
        worker: Option<&BotWorker>,
        status: &SharedStatus,
        work: F,
    ) -> Result<Option<String>, Error>
    where
        F: FnOnce(Arc<dyn ModerationApi>) -> Fut,
        Fut: Future<Output = Result<Option<String>, Error>> + Send + 'static,
    {
        let worker = worker.filter(|w| w.is_alive()).ok_or(Error::NotRunning)?;
        if !status.is_connected() {
            return Err(Error::NotConnected);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let fut = work(worker.api());
        worker.runtime().spawn(async move {
            let result = fut.await;
            if tx.send(result).is_err() {
                debug!("(Invoker) caller gave up before the result arrived");
            }
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!("(Invoker) no result after {:?}; abandoning", self.timeout);
                Err(Error::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerStopped),
        }
    }
}
