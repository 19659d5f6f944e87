// File: src/services/mod.rs

pub mod discord;
pub mod moderation;

pub use moderation::{ModerationAction, execute, resolve_target};
