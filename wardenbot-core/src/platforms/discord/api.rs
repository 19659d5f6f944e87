use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_http::request::AuditLogReason;
use twilight_model::guild::Member;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};
use wardenbot_common::models::{GuildInfo, MemberEdit, MemberInfo};

use crate::Error;
use crate::platforms::ModerationApi;

/// [`ModerationApi`] backed by twilight's REST client.
///
/// Guilds are looked up in the gateway-fed cache first; members are always
/// fetched so a nickname or voice change made since READY is picked up.
pub struct TwilightModerationApi {
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
}

impl TwilightModerationApi {
    pub fn new(http: Arc<HttpClient>, cache: Arc<InMemoryCache>) -> Self {
        Self { http, cache }
    }
}

pub(crate) fn member_info(member: &Member) -> MemberInfo {
    let display_name = member
        .nick
        .clone()
        .or_else(|| member.user.global_name.clone())
        .unwrap_or_else(|| member.user.name.clone());

    MemberInfo {
        user_id: member.user.id,
        username: member.user.name.clone(),
        display_name,
    }
}

#[async_trait]
impl ModerationApi for TwilightModerationApi {
    async fn guild(&self, guild_id: Id<GuildMarker>) -> Result<GuildInfo, Error> {
        if let Some(cached) = self.cache.guild(guild_id) {
            return Ok(GuildInfo {
                guild_id,
                name: cached.name().to_string(),
            });
        }

        debug!("(TwilightModerationApi) guild {guild_id} not cached => fetching");
        let guild = self.http.guild(guild_id).await?.model().await?;
        Ok(GuildInfo {
            guild_id,
            name: guild.name,
        })
    }

    async fn member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<MemberInfo, Error> {
        let member = self
            .http
            .guild_member(guild_id, user_id)
            .await?
            .model()
            .await?;
        Ok(member_info(&member))
    }

    async fn ban(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        reason: &str,
    ) -> Result<(), Error> {
        self.http
            .create_ban(guild_id, user_id)
            .reason(reason)
            .await?;
        Ok(())
    }

    async fn edit_member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        edit: MemberEdit,
        reason: &str,
    ) -> Result<(), Error> {
        let mut request = self.http.update_guild_member(guild_id, user_id);
        if let Some(mute) = edit.mute {
            request = request.mute(mute);
        }
        if let Some(deaf) = edit.deaf {
            request = request.deaf(deaf);
        }
        request.reason(reason).await?;
        Ok(())
    }

    async fn move_member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        channel_id: Option<Id<ChannelMarker>>,
    ) -> Result<(), Error> {
        self.http
            .update_guild_member(guild_id, user_id)
            .channel_id(channel_id)
            .await?;
        Ok(())
    }
}
