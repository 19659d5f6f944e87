// File: src/platforms/mod.rs

use async_trait::async_trait;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};
use wardenbot_common::models::{GuildInfo, MemberEdit, MemberInfo};

use crate::Error;

/// The remote calls moderation needs from the chat platform.
///
/// Every method is one request from our point of view; rate limiting and
/// retries on the wire belong to the client library underneath.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationApi: Send + Sync {
    async fn guild(&self, guild_id: Id<GuildMarker>) -> Result<GuildInfo, Error>;
    async fn member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<MemberInfo, Error>;
    async fn ban(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        reason: &str,
    ) -> Result<(), Error>;
    async fn edit_member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        edit: MemberEdit,
        reason: &str,
    ) -> Result<(), Error>;
    /// `None` disconnects the member from voice.
    async fn move_member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        channel_id: Option<Id<ChannelMarker>>,
    ) -> Result<(), Error>;
}

// Re-export submodules
pub mod discord;
