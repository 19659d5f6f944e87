// File: wardenbot-common/src/models/mod.rs
pub mod discord;
pub mod intents;
pub mod status;

pub use discord::{GuildInfo, MemberEdit, MemberInfo, TargetRef};
pub use intents::IntentsMode;
pub use status::{BotStatus, SharedStatus};
