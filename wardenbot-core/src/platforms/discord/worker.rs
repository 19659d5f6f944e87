use std::future::Future;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_http::client::ClientBuilder;
use wardenbot_common::models::{BotStatus, IntentsMode, SharedStatus};

use crate::Error;
use crate::config::BotConfig;
use crate::platforms::ModerationApi;
use crate::platforms::discord::api::TwilightModerationApi;
use crate::platforms::discord::runtime::{GatewayContext, run_gateway};
use crate::services::discord::confirm::PendingConfirmations;

const WORKER_THREAD_NAME: &str = "wardenbot-worker";

/// Where a worker is in its life, derived from thread liveness plus the
/// status record. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    NotStarted,
    Starting,
    Connected,
    Disconnected,
    Terminated(String),
}

impl WorkerState {
    pub fn derive(alive: Option<bool>, status: &BotStatus) -> Self {
        match alive {
            None => WorkerState::NotStarted,
            Some(false) => {
                if status.last_error.is_empty() {
                    WorkerState::Terminated("worker stopped".to_string())
                } else {
                    WorkerState::Terminated(status.last_error.clone())
                }
            }
            Some(true) if status.connected => WorkerState::Connected,
            Some(true) if status.identity.is_empty() => WorkerState::Starting,
            Some(true) => WorkerState::Disconnected,
        }
    }
}

/// Single-threaded runtime each worker thread drives.
pub fn worker_runtime() -> Result<Runtime, Error> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// A running bot thread and the handles needed to talk to it.
///
/// Never mutated after spawn; a mode change means a new `BotWorker`.
pub struct BotWorker {
    mode: IntentsMode,
    thread: Option<JoinHandle<()>>,
    runtime: Handle,
    api: Arc<dyn ModerationApi>,
    shutdown: CancellationToken,
}

impl BotWorker {
    /// Moves `runtime` onto a new thread and drives `run()` on it until the
    /// future ends or [`BotWorker::shutdown`] is called.
    pub fn start<F, Fut>(
        runtime: Runtime,
        mode: IntentsMode,
        api: Arc<dyn ModerationApi>,
        run: F,
    ) -> Result<Self, Error>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let handle = runtime.handle().clone();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let thread = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    tokio::select! {
                        _ = run() => {
                            info!("(BotWorker) run loop finished");
                        }
                        _ = token.cancelled() => {
                            info!("(BotWorker) shutdown requested");
                        }
                    }
                });
            })?;

        info!("(BotWorker) spawned worker thread with {mode} intents");

        Ok(Self {
            mode,
            thread: Some(thread),
            runtime: handle,
            api,
            shutdown,
        })
    }

    pub fn mode(&self) -> IntentsMode {
        self.mode
    }

    pub fn is_alive(&self) -> bool {
        self.thread
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn api(&self) -> Arc<dyn ModerationApi> {
        self.api.clone()
    }

    /// Cancels the run loop and waits for the thread to exit.
    pub fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("(BotWorker) worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for BotWorker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Builds workers for a given capability set.
pub trait WorkerFactory: Send {
    fn spawn(&self, mode: IntentsMode, status: SharedStatus) -> Result<BotWorker, Error>;
}

/// The real thing: a twilight shard plus REST client on a worker thread.
pub struct DiscordWorkerFactory {
    config: Arc<BotConfig>,
}

impl DiscordWorkerFactory {
    pub fn new(config: Arc<BotConfig>) -> Self {
        Self { config }
    }
}

impl WorkerFactory for DiscordWorkerFactory {
    fn spawn(&self, mode: IntentsMode, status: SharedStatus) -> Result<BotWorker, Error> {
        let runtime = worker_runtime()?;

        let (api, ctx) = {
            // the HTTP client wants a reactor around when it is built
            let _guard = runtime.enter();

            let http = Arc::new(
                ClientBuilder::new()
                    .token(self.config.token.clone())
                    .timeout(Duration::from_secs(30))
                    .build(),
            );
            let cache = Arc::new(
                InMemoryCache::builder()
                    .resource_types(
                        ResourceType::GUILD
                            | ResourceType::MEMBER
                            | ResourceType::USER_CURRENT
                            | ResourceType::VOICE_STATE,
                    )
                    .build(),
            );
            let api: Arc<dyn ModerationApi> =
                Arc::new(TwilightModerationApi::new(http.clone(), cache.clone()));

            let ctx = GatewayContext {
                config: self.config.clone(),
                mode,
                http,
                cache,
                api: api.clone(),
                status,
                confirmations: Arc::new(PendingConfirmations::default()),
            };
            (api, ctx)
        };

        BotWorker::start(runtime, mode, api, move || run_gateway(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::MockModerationApi;

    #[test]
    fn state_is_derived_from_liveness_and_status() {
        let mut status = BotStatus::default();
        assert_eq!(WorkerState::derive(None, &status), WorkerState::NotStarted);
        assert_eq!(WorkerState::derive(Some(true), &status), WorkerState::Starting);

        status.connected = true;
        status.identity = "warden (1)".into();
        assert_eq!(WorkerState::derive(Some(true), &status), WorkerState::Connected);

        status.connected = false;
        assert_eq!(WorkerState::derive(Some(true), &status), WorkerState::Disconnected);

        status.last_error = "bad token".into();
        assert_eq!(
            WorkerState::derive(Some(false), &status),
            WorkerState::Terminated("bad token".into())
        );
    }

    #[test]
    fn shutdown_joins_the_thread() {
        let runtime = worker_runtime().unwrap();
        let api: Arc<dyn ModerationApi> = Arc::new(MockModerationApi::new());
        let worker = BotWorker::start(runtime, IntentsMode::Standard, api, || {
            std::future::pending::<()>()
        })
        .unwrap();

        assert!(worker.is_alive());
        assert_eq!(worker.mode(), IntentsMode::Standard);
        worker.shutdown();
    }

    #[test]
    fn finished_run_loop_means_dead_worker() {
        let runtime = worker_runtime().unwrap();
        let api: Arc<dyn ModerationApi> = Arc::new(MockModerationApi::new());
        let worker =
            BotWorker::start(runtime, IntentsMode::Privileged, api, || async {}).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while worker.is_alive() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!worker.is_alive());
    }
}
