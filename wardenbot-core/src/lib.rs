// src/lib.rs

pub mod config;
pub mod invoker;
pub mod platforms;
pub mod services;
pub mod supervisor;
pub mod test_utils;

pub use config::BotConfig;
pub use invoker::{InvokeOutcome, Invoker};
pub use supervisor::{StartOutcome, WorkerSupervisor};
pub use wardenbot_common::error::Error;
