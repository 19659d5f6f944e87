pub mod api;
pub mod runtime;
pub mod worker;

pub use api::TwilightModerationApi;
pub use worker::{BotWorker, DiscordWorkerFactory, WorkerFactory, WorkerState, worker_runtime};
