// File: wardenbot-core/src/services/discord/slashcommands/mod.rs

pub mod ban;
pub mod commands;

use std::sync::Arc;

use tracing::{debug, info, warn};
use twilight_http::Client as HttpClient;
use twilight_model::application::interaction::application_command::CommandDataOption;
use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::channel::message::MessageFlags;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, GuildMarker, UserMarker};
use twilight_util::builder::InteractionResponseDataBuilder;
use wardenbot_common::models::TargetRef;

use crate::Error;
use crate::platforms::ModerationApi;
use crate::services::discord::confirm::PendingConfirmations;
use crate::services::moderation::{ModerationAction, execute};

pub use commands::{SlashRequest, moderation_commands, parse_command};

/// What the interaction handlers share once the gateway is READY.
pub struct CommandContext {
    pub http: Arc<HttpClient>,
    pub application_id: Id<ApplicationMarker>,
    pub guild_id: Option<Id<GuildMarker>>,
    pub target_user_id: Option<Id<UserMarker>>,
    pub api: Arc<dyn ModerationApi>,
    pub confirmations: Arc<PendingConfirmations>,
}

/// Replaces the command set. Guild-scoped when a guild is configured so the
/// commands show up immediately, global otherwise.
pub async fn register_moderation_commands(ctx: &CommandContext) -> Result<(), Error> {
    let commands = moderation_commands(ctx.target_user_id.is_some());
    let client = ctx.http.interaction(ctx.application_id);

    match ctx.guild_id {
        Some(guild_id) => {
            client
                .set_guild_commands(guild_id, &commands)
                .await
                .map_err(|e| Error::Platform(format!("Failed to register guild slash commands: {e}")))?;
            info!("(SlashCommands) registered {} commands in guild {guild_id}", commands.len());
        }
        None => {
            client
                .set_global_commands(&commands)
                .await
                .map_err(|e| Error::Platform(format!("Failed to register global slash commands: {e}")))?;
            info!("(SlashCommands) registered {} global commands", commands.len());
        }
    }

    Ok(())
}

/// Dispatches slash commands and ban prompt buttons.
pub async fn handle_interaction_create(
    ctx: &CommandContext,
    interaction: &Interaction,
) -> Result<(), Error> {
    match &interaction.data {
        Some(InteractionData::ApplicationCommand(data)) => {
            let response = handle_command(ctx, interaction, &data.name, &data.options).await;
            respond(ctx, interaction, &response).await
        }
        Some(InteractionData::MessageComponent(data)) => {
            ban::handle_component(ctx, interaction, &data.custom_id).await
        }
        _ => {
            debug!("(SlashCommands) ignoring interaction kind {:?}", interaction.kind);
            Ok(())
        }
    }
}

async fn handle_command(
    ctx: &CommandContext,
    interaction: &Interaction,
    name: &str,
    options: &[CommandDataOption],
) -> InteractionResponse {
    match run_command(ctx, interaction, name, options).await {
        Ok(response) => response,
        Err(e) => ephemeral_message(format!("❌ {e}")),
    }
}

async fn run_command(
    ctx: &CommandContext,
    interaction: &Interaction,
    name: &str,
    options: &[CommandDataOption],
) -> Result<InteractionResponse, Error> {
    let guild_id = ensure_guild(interaction.guild_id, ctx.guild_id)?;
    let request = parse_command(name, options, ctx.target_user_id)?;
    let requester = interaction
        .author_id()
        .ok_or_else(|| Error::Platform("command interaction without an author".to_string()))?;

    let permissions = interaction.member.as_ref().and_then(|m| m.permissions);
    ensure_permission(permissions, request.action.required_permission())?;

    let target = TargetRef::new(guild_id, request.user_id);
    info!(
        "(SlashCommands) /{name} from {requester} => {}",
        request.user_id
    );

    if request.action == ModerationAction::Ban {
        return ban::prompt(ctx, requester, target, request.reason).await;
    }

    let content = match execute(ctx.api.as_ref(), target, request.action, request.reason.as_deref()).await {
        Ok(message) => message,
        Err(e) => {
            warn!("(SlashCommands) /{name} failed => {e}");
            format!("❌ Could not {} <@{}>: {e}", request.action.name(), request.user_id)
        }
    };
    Ok(ephemeral_message(content))
}

/// Commands only run inside the configured guild, or in any guild when none
/// is configured. Direct messages are refused.
pub fn ensure_guild(
    interaction_guild: Option<Id<GuildMarker>>,
    configured: Option<Id<GuildMarker>>,
) -> Result<Id<GuildMarker>, Error> {
    let guild_id = interaction_guild.ok_or_else(|| {
        Error::PermissionDenied("This command only works inside a server.".to_string())
    })?;
    match configured {
        Some(expected) if expected != guild_id => Err(Error::PermissionDenied(
            "This command is not enabled in this server.".to_string(),
        )),
        _ => Ok(guild_id),
    }
}

pub fn ensure_permission(
    granted: Option<Permissions>,
    required: Permissions,
) -> Result<(), Error> {
    let granted = granted.unwrap_or_else(Permissions::empty);
    if granted.contains(Permissions::ADMINISTRATOR) || granted.contains(required) {
        Ok(())
    } else {
        Err(Error::PermissionDenied(format!(
            "You need the {} permission.",
            permission_name(required)
        )))
    }
}

fn permission_name(permission: Permissions) -> &'static str {
    if permission == Permissions::BAN_MEMBERS {
        "Ban Members"
    } else if permission == Permissions::MUTE_MEMBERS {
        "Mute Members"
    } else if permission == Permissions::DEAFEN_MEMBERS {
        "Deafen Members"
    } else if permission == Permissions::MOVE_MEMBERS {
        "Move Members"
    } else {
        "required"
    }
}

pub fn ephemeral_message(content: impl Into<String>) -> InteractionResponse {
    InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(
            InteractionResponseDataBuilder::new()
                .content(content)
                .flags(MessageFlags::EPHEMERAL)
                .build(),
        ),
    }
}

pub(crate) async fn respond(
    ctx: &CommandContext,
    interaction: &Interaction,
    response: &InteractionResponse,
) -> Result<(), Error> {
    ctx.http
        .interaction(ctx.application_id)
        .create_response(interaction.id, &interaction.token, response)
        .await?;
    Ok(())
}
