//! Owns at most one bot worker and answers the dashboard's questions about it.

use std::sync::Arc;

use tracing::{info, warn};
use wardenbot_common::models::{BotStatus, IntentsMode, SharedStatus, TargetRef};

use crate::Error;
use crate::config::BotConfig;
use crate::invoker::{InvokeOutcome, Invoker};
use crate::platforms::discord::{BotWorker, DiscordWorkerFactory, WorkerFactory, WorkerState};
use crate::services::moderation::{ModerationAction, execute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// The old worker was stopped because the intents mode changed.
    Restarted,
}

pub struct WorkerSupervisor<F: WorkerFactory> {
    factory: F,
    status: SharedStatus,
    worker: Option<BotWorker>,
    invoker: Invoker,
    target: Option<TargetRef>,
}

impl WorkerSupervisor<DiscordWorkerFactory> {
    pub fn from_config(config: BotConfig) -> Self {
        let invoker = Invoker::new(config.invoke_timeout);
        let target = config.target();
        Self::new(DiscordWorkerFactory::new(Arc::new(config)), invoker, target)
    }
}

impl<F: WorkerFactory> WorkerSupervisor<F> {
    pub fn new(factory: F, invoker: Invoker, target: Option<TargetRef>) -> Self {
        Self {
            factory,
            status: SharedStatus::new(),
            worker: None,
            invoker,
            target,
        }
    }

    /// Starts a worker for `mode`.
    ///
    /// A live worker already in `mode` is left alone. A live worker in the
    /// other mode is stopped and joined before the new one is spawned, so two
    /// workers never share one token.
    pub fn start(&mut self, mode: IntentsMode) -> Result<StartOutcome, Error> {
        let mut outcome = StartOutcome::Started;

        if let Some(worker) = self.worker.take() {
            if worker.is_alive() {
                if worker.mode() == mode {
                    self.worker = Some(worker);
                    info!("(WorkerSupervisor) worker already running in {mode} mode");
                    return Ok(StartOutcome::AlreadyRunning);
                }
                info!(
                    "(WorkerSupervisor) mode change {} => {mode}; stopping old worker",
                    worker.mode()
                );
                outcome = StartOutcome::Restarted;
            }
            worker.shutdown();
        }

        self.status.reset();
        match self.factory.spawn(mode, self.status.clone()) {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(outcome)
            }
            Err(e) => {
                warn!("(WorkerSupervisor) could not spawn worker => {e}");
                self.status.mark_failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            info!("(WorkerSupervisor) stopping worker");
            worker.shutdown();
        }
        self.status.mark_disconnected();
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| w.is_alive())
    }

    /// Mode of the current worker, live or not.
    pub fn mode(&self) -> Option<IntentsMode> {
        self.worker.as_ref().map(|w| w.mode())
    }

    pub fn state(&self) -> WorkerState {
        let alive = self.worker.as_ref().map(|w| w.is_alive());
        WorkerState::derive(alive, &self.status.snapshot())
    }

    pub fn status(&self) -> BotStatus {
        self.status.snapshot()
    }

    pub fn target(&self) -> Option<TargetRef> {
        self.target
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Runs one dashboard action against the configured target and waits
    /// for the result.
    pub fn run_action(&self, action: ModerationAction) -> InvokeOutcome {
        let Some(target) = self.target else {
            return InvokeOutcome::failure(&Error::Config(
                "GUILD_ID and TARGET_USER_ID must both be set".to_string(),
            ));
        };

        info!("(WorkerSupervisor) dashboard action {} => {}", action.name(), target.user_id);
        self.invoker
            .invoke(self.worker.as_ref(), &self.status, move |api| async move {
                execute(api.as_ref(), target, action, None).await.map(Some)
            })
    }
}

impl<F: WorkerFactory> Drop for WorkerSupervisor<F> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}
