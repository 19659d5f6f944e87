// File: wardenbot-core/src/services/discord/slashcommands/commands.rs

use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::application_command::{
    CommandDataOption, CommandOptionValue,
};
use twilight_model::channel::ChannelType;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;
use twilight_util::builder::command::{ChannelBuilder, CommandBuilder, StringBuilder, UserBuilder};

use crate::Error;
use crate::services::moderation::ModerationAction;

pub const OPT_MEMBER: &str = "member";
pub const OPT_REASON: &str = "reason";
pub const OPT_CHANNEL: &str = "channel";

/// A parsed moderation slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashRequest {
    pub action: ModerationAction,
    pub user_id: Id<UserMarker>,
    pub reason: Option<String>,
}

fn base(name: &str, description: &str, permissions: Permissions, fixed_target: bool) -> CommandBuilder {
    let builder = CommandBuilder::new(name, description, CommandType::ChatInput)
        .default_member_permissions(permissions);
    if fixed_target {
        builder
    } else {
        builder.option(UserBuilder::new(OPT_MEMBER, "Member to act on").required(true))
    }
}

fn with_reason(builder: CommandBuilder) -> CommandBuilder {
    builder.option(StringBuilder::new(OPT_REASON, "Reason (optional)"))
}

/// Every command the bot registers. With a fixed target the `member`
/// option is left out and the configured member is used instead.
pub fn moderation_commands(fixed_target: bool) -> Vec<Command> {
    vec![
        with_reason(base(
            "ban",
            "Ban the member (asks for confirmation)",
            Permissions::BAN_MEMBERS,
            fixed_target,
        ))
        .build(),
        with_reason(base(
            "mute",
            "Server-mute the member in voice",
            Permissions::MUTE_MEMBERS,
            fixed_target,
        ))
        .build(),
        with_reason(base(
            "unmute",
            "Remove the server mute",
            Permissions::MUTE_MEMBERS,
            fixed_target,
        ))
        .build(),
        with_reason(base(
            "deafen",
            "Server-deafen the member",
            Permissions::DEAFEN_MEMBERS,
            fixed_target,
        ))
        .build(),
        with_reason(base(
            "undeafen",
            "Remove the server deafen",
            Permissions::DEAFEN_MEMBERS,
            fixed_target,
        ))
        .build(),
        base(
            "move",
            "Move the member to a voice channel",
            Permissions::MOVE_MEMBERS,
            fixed_target,
        )
        .option(
            ChannelBuilder::new(OPT_CHANNEL, "Target voice channel")
                .channel_types([ChannelType::GuildVoice, ChannelType::GuildStageVoice])
                .required(true),
        )
        .build(),
        base(
            "disconnect",
            "Disconnect the member from voice",
            Permissions::MOVE_MEMBERS,
            fixed_target,
        )
        .build(),
    ]
}

/// Turns a command name plus its options into a request.
///
/// `fixed_target` wins over any `member` option.
pub fn parse_command(
    name: &str,
    options: &[CommandDataOption],
    fixed_target: Option<Id<UserMarker>>,
) -> Result<SlashRequest, Error> {
    let mut member = None;
    let mut reason = None;
    let mut channel = None;

    for option in options {
        match (option.name.as_str(), &option.value) {
            (OPT_MEMBER, CommandOptionValue::User(id)) => member = Some(*id),
            (OPT_REASON, CommandOptionValue::String(text)) => {
                let text = text.trim();
                if !text.is_empty() {
                    reason = Some(text.to_string());
                }
            }
            (OPT_CHANNEL, CommandOptionValue::Channel(id)) => channel = Some(*id),
            _ => {}
        }
    }

    let action = match name {
        "ban" => ModerationAction::Ban,
        "mute" => ModerationAction::Mute,
        "unmute" => ModerationAction::Unmute,
        "deafen" => ModerationAction::Deafen,
        "undeafen" => ModerationAction::Undeafen,
        "disconnect" => ModerationAction::Disconnect,
        "move" => ModerationAction::Move {
            channel_id: channel
                .ok_or_else(|| Error::Parse("/move needs a voice channel".to_string()))?,
        },
        other => return Err(Error::Parse(format!("Unrecognized command: {other}"))),
    };

    let user_id = fixed_target
        .or(member)
        .ok_or_else(|| Error::Parse(format!("/{name} needs a member")))?;

    Ok(SlashRequest {
        action,
        user_id,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(name: &str, value: CommandOptionValue) -> CommandDataOption {
        CommandDataOption {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn registers_all_moderation_commands() {
        let names: Vec<String> = moderation_commands(true)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            ["ban", "mute", "unmute", "deafen", "undeafen", "move", "disconnect"]
        );
    }

    #[test]
    fn member_option_only_without_fixed_target() {
        for command in moderation_commands(true) {
            assert!(command.options.iter().all(|o| o.name != OPT_MEMBER), "{}", command.name);
        }
        for command in moderation_commands(false) {
            assert_eq!(command.options[0].name, OPT_MEMBER, "{}", command.name);
        }
    }

    #[test]
    fn commands_carry_default_permissions() {
        let commands = moderation_commands(true);
        assert_eq!(commands[0].default_member_permissions, Some(Permissions::BAN_MEMBERS));
        assert_eq!(commands[5].default_member_permissions, Some(Permissions::MOVE_MEMBERS));
    }

    #[test]
    fn fixed_target_overrides_member_option() {
        let fixed = Id::new(313356139163156493);
        let request = parse_command(
            "mute",
            &[opt(OPT_MEMBER, CommandOptionValue::User(Id::new(5)))],
            Some(fixed),
        )
        .unwrap();
        assert_eq!(request.user_id, fixed);
        assert_eq!(request.action, ModerationAction::Mute);
    }

    #[test]
    fn generic_variant_reads_member_and_reason() {
        let request = parse_command(
            "ban",
            &[
                opt(OPT_MEMBER, CommandOptionValue::User(Id::new(7))),
                opt(OPT_REASON, CommandOptionValue::String(" raid ".into())),
            ],
            None,
        )
        .unwrap();
        assert_eq!(request.user_id, Id::new(7));
        assert_eq!(request.reason.as_deref(), Some("raid"));
    }

    #[test]
    fn move_needs_a_channel_and_missing_member_is_an_error() {
        assert!(parse_command("move", &[], Some(Id::new(1))).is_err());

        let request = parse_command(
            "move",
            &[opt(OPT_CHANNEL, CommandOptionValue::Channel(Id::new(99)))],
            Some(Id::new(1)),
        )
        .unwrap();
        assert_eq!(request.action, ModerationAction::Move { channel_id: Id::new(99) });

        assert!(parse_command("deafen", &[], None).is_err());
        assert!(parse_command("kick", &[], Some(Id::new(1))).is_err());
    }
}
