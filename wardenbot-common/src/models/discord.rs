use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};

/// The guild member every dashboard action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetRef {
    pub guild_id: Id<GuildMarker>,
    pub user_id: Id<UserMarker>,
}

impl TargetRef {
    pub fn new(guild_id: Id<GuildMarker>, user_id: Id<UserMarker>) -> Self {
        Self { guild_id, user_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub guild_id: Id<GuildMarker>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub user_id: Id<UserMarker>,
    pub username: String,
    /// Nickname, then global name, then username.
    pub display_name: String,
}

impl MemberInfo {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.user_id)
    }
}

/// Voice flags to change on a member. `None` leaves the flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberEdit {
    pub mute: Option<bool>,
    pub deaf: Option<bool>,
}

impl MemberEdit {
    pub fn mute(value: bool) -> Self {
        Self { mute: Some(value), deaf: None }
    }

    pub fn deaf(value: bool) -> Self {
        Self { mute: None, deaf: Some(value) }
    }
}
