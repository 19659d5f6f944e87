use tracing::info;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;
use wardenbot_common::models::{GuildInfo, MemberEdit, MemberInfo, TargetRef};

use crate::Error;
use crate::platforms::ModerationApi;

/// One state-changing call against a guild member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Ban,
    Mute,
    Unmute,
    Deafen,
    Undeafen,
    Move { channel_id: Id<ChannelMarker> },
    Disconnect,
}

impl ModerationAction {
    pub fn name(&self) -> &'static str {
        match self {
            ModerationAction::Ban => "ban",
            ModerationAction::Mute => "mute",
            ModerationAction::Unmute => "unmute",
            ModerationAction::Deafen => "deafen",
            ModerationAction::Undeafen => "undeafen",
            ModerationAction::Move { .. } => "move",
            ModerationAction::Disconnect => "disconnect",
        }
    }

    pub fn required_permission(&self) -> Permissions {
        match self {
            ModerationAction::Ban => Permissions::BAN_MEMBERS,
            ModerationAction::Mute | ModerationAction::Unmute => Permissions::MUTE_MEMBERS,
            ModerationAction::Deafen | ModerationAction::Undeafen => Permissions::DEAFEN_MEMBERS,
            ModerationAction::Move { .. } | ModerationAction::Disconnect => {
                Permissions::MOVE_MEMBERS
            }
        }
    }

    fn success_message(&self, member: &MemberInfo) -> String {
        let name = &member.display_name;
        match self {
            ModerationAction::Ban => format!("✅ {name} banned."),
            ModerationAction::Mute => format!("✅ {name} muted."),
            ModerationAction::Unmute => format!("✅ {name} unmuted."),
            ModerationAction::Deafen => format!("✅ {name} deafened."),
            ModerationAction::Undeafen => format!("✅ {name} undeafened."),
            ModerationAction::Move { channel_id } => format!("✅ {name} moved to <#{channel_id}>."),
            ModerationAction::Disconnect => format!("✅ {name} disconnected from voice."),
        }
    }
}

/// Looks the guild and member up, in that order.
///
/// Any failure here becomes [`Error::NotFound`] so nothing is attempted
/// against a target we could not see.
pub async fn resolve_target(
    api: &dyn ModerationApi,
    target: TargetRef,
) -> Result<(GuildInfo, MemberInfo), Error> {
    let guild = api
        .guild(target.guild_id)
        .await
        .map_err(|e| Error::NotFound(format!("guild {}: {e}", target.guild_id)))?;
    let member = api
        .member(target.guild_id, target.user_id)
        .await
        .map_err(|e| Error::NotFound(format!("member {} in {}: {e}", target.user_id, guild.name)))?;
    Ok((guild, member))
}

/// Resolves `target`, then issues exactly one remote call for `action`.
pub async fn execute(
    api: &dyn ModerationApi,
    target: TargetRef,
    action: ModerationAction,
    reason: Option<&str>,
) -> Result<String, Error> {
    let (guild, member) = resolve_target(api, target).await?;
    let default_reason = format!("{} via wardenbot", action.name());
    let reason = reason.unwrap_or(&default_reason);

    info!(
        "(Moderation) {} => {} (@{}, {}) in {}",
        action.name(),
        member.display_name,
        member.username,
        member.user_id,
        guild.name
    );

    match action {
        ModerationAction::Ban => api.ban(guild.guild_id, member.user_id, reason).await?,
        ModerationAction::Mute => {
            api.edit_member(guild.guild_id, member.user_id, MemberEdit::mute(true), reason)
                .await?
        }
        ModerationAction::Unmute => {
            api.edit_member(guild.guild_id, member.user_id, MemberEdit::mute(false), reason)
                .await?
        }
        ModerationAction::Deafen => {
            api.edit_member(guild.guild_id, member.user_id, MemberEdit::deaf(true), reason)
                .await?
        }
        ModerationAction::Undeafen => {
            api.edit_member(guild.guild_id, member.user_id, MemberEdit::deaf(false), reason)
                .await?
        }
        ModerationAction::Move { channel_id } => {
            api.move_member(guild.guild_id, member.user_id, Some(channel_id))
                .await?
        }
        ModerationAction::Disconnect => {
            api.move_member(guild.guild_id, member.user_id, None).await?
        }
    }

    Ok(action.success_message(&member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::MockModerationApi;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn target() -> TargetRef {
        TargetRef::new(Id::new(1101494689649152010), Id::new(313356139163156493))
    }

    fn guild_ok(api: &mut MockModerationApi) {
        api.expect_guild().returning(|guild_id| {
            Ok(GuildInfo {
                guild_id,
                name: "Run it back".into(),
            })
        });
    }

    fn member_ok(api: &mut MockModerationApi) {
        api.expect_member().returning(|_, user_id| {
            Ok(MemberInfo {
                user_id,
                username: "justnexio".into(),
                display_name: "nexio".into(),
            })
        });
    }

    #[tokio::test]
    async fn mute_issues_one_edit_with_mute_true() {
        let mut api = MockModerationApi::new();
        guild_ok(&mut api);
        member_ok(&mut api);
        api.expect_edit_member()
            .withf(|_, _, edit, _| *edit == MemberEdit::mute(true))
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        api.expect_ban().never();
        api.expect_move_member().never();

        let msg = assert_ok!(execute(&api, target(), ModerationAction::Mute, None).await);
        assert_eq!(msg, "✅ nexio muted.");
    }

    #[tokio::test]
    async fn ban_passes_reason_through() {
        let mut api = MockModerationApi::new();
        guild_ok(&mut api);
        member_ok(&mut api);
        api.expect_ban()
            .withf(|_, user, reason| user.get() == 313356139163156493 && reason.to_string() == "spam")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let msg = execute(&api, target(), ModerationAction::Ban, Some("spam"))
            .await
            .unwrap();
        assert!(msg.contains("nexio"));
    }

    #[tokio::test]
    async fn disconnect_moves_to_no_channel() {
        let mut api = MockModerationApi::new();
        guild_ok(&mut api);
        member_ok(&mut api);
        api.expect_move_member()
            .with(eq(target().guild_id), eq(target().user_id), eq(None))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let msg = execute(&api, target(), ModerationAction::Disconnect, None)
            .await
            .unwrap();
        assert!(msg.contains("disconnected"));
    }

    #[tokio::test]
    async fn unknown_guild_aborts_before_any_change() {
        let mut api = MockModerationApi::new();
        api.expect_guild()
            .returning(|_| Err(Error::NotFound("Unknown Guild".into())));
        api.expect_member().never();
        api.expect_ban().never();
        api.expect_edit_member().never();
        api.expect_move_member().never();

        let err = assert_err!(execute(&api, target(), ModerationAction::Ban, None).await);
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("Target not found"));
    }

    #[tokio::test]
    async fn member_lookup_failure_is_not_found_too() {
        let mut api = MockModerationApi::new();
        guild_ok(&mut api);
        api.expect_member()
            .returning(|_, _| Err(Error::Http("503 Service Unavailable".into())));
        api.expect_edit_member().never();

        let err = assert_err!(execute(&api, target(), ModerationAction::Deafen, None).await);
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn remote_rejection_is_returned_verbatim() {
        let mut api = MockModerationApi::new();
        guild_ok(&mut api);
        member_ok(&mut api);
        api.expect_edit_member()
            .returning(|_, _, _, _| Err(Error::PermissionDenied("Missing Permissions".into())));

        let err = assert_err!(execute(&api, target(), ModerationAction::Undeafen, None).await);
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn permissions_follow_the_action() {
        assert_eq!(ModerationAction::Ban.required_permission(), Permissions::BAN_MEMBERS);
        assert_eq!(ModerationAction::Unmute.required_permission(), Permissions::MUTE_MEMBERS);
        assert_eq!(
            ModerationAction::Disconnect.required_permission(),
            Permissions::MOVE_MEMBERS
        );
    }
}
