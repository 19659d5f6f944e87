// File: wardenbot-core/src/services/discord/slashcommands/ban.rs

use std::time::Instant;

use tracing::{debug, info};
use twilight_model::application::interaction::Interaction;
use twilight_model::channel::message::MessageFlags;
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use uuid::Uuid;
use wardenbot_common::models::TargetRef;

use crate::Error;
use crate::platforms::ModerationApi;
use crate::services::discord::confirm::{ConfirmError, PendingConfirmations};

use super::{CommandContext, ensure_guild, ensure_permission, ephemeral_message, respond};

const CONFIRM_PREFIX: &str = "ban:confirm:";
const CANCEL_PREFIX: &str = "ban:cancel:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanChoice {
    Confirm,
    Cancel,
}

/// Result of pressing one of the prompt buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// The prompt is done; rewrite it with this text and disable the buttons.
    Finished(String),
    /// Someone else pressed it; answer them privately and leave the prompt.
    Rejected(String),
}

pub fn parse_custom_id(custom_id: &str) -> Option<(BanChoice, Uuid)> {
    let (choice, raw) = if let Some(raw) = custom_id.strip_prefix(CONFIRM_PREFIX) {
        (BanChoice::Confirm, raw)
    } else if let Some(raw) = custom_id.strip_prefix(CANCEL_PREFIX) {
        (BanChoice::Cancel, raw)
    } else {
        return None;
    };
    Uuid::parse_str(raw).ok().map(|token| (choice, token))
}

fn buttons(token: Uuid, disabled: bool) -> Component {
    let button = |prefix: &str, label: &str, style: ButtonStyle| {
        Component::Button(Button {
            custom_id: Some(format!("{prefix}{token}")),
            disabled,
            emoji: None,
            label: Some(label.to_string()),
            style,
            url: None,
            sku_id: None,
        })
    };

    Component::ActionRow(ActionRow {
        components: vec![
            button(CONFIRM_PREFIX, "Confirm ban", ButtonStyle::Danger),
            button(CANCEL_PREFIX, "Cancel", ButtonStyle::Secondary),
        ],
    })
}

/// Resolves the member and answers `/ban` with an ephemeral accept/cancel
/// prompt owned by `requester`.
pub(crate) async fn prompt(
    ctx: &CommandContext,
    requester: Id<UserMarker>,
    target: TargetRef,
    reason: Option<String>,
) -> Result<InteractionResponse, Error> {
    let member = ctx
        .api
        .member(target.guild_id, target.user_id)
        .await
        .map_err(|e| Error::NotFound(format!("member {}: {e}", target.user_id)))?;

    let reason = reason.unwrap_or_else(|| "No reason given".to_string());
    let token = ctx
        .confirmations
        .request(requester, target, reason, Instant::now());
    debug!("(BanPrompt) {requester} asked to ban {} => token {token}", member.user_id);

    Ok(InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(
            InteractionResponseDataBuilder::new()
                .content(format!("Do you really want to ban {}?", member.mention()))
                .flags(MessageFlags::EPHEMERAL)
                .components([buttons(token, false)])
                .build(),
        ),
    })
}

/// Applies a button press. Only the requester's confirmation of a live
/// prompt reaches the ban call.
pub async fn resolve_choice(
    api: &dyn ModerationApi,
    confirmations: &PendingConfirmations,
    choice: BanChoice,
    token: Uuid,
    actor: Id<UserMarker>,
    actor_permissions: Option<Permissions>,
    now: Instant,
) -> ChoiceOutcome {
    let taken = match choice {
        BanChoice::Confirm => confirmations.accept(token, actor, now),
        BanChoice::Cancel => confirmations.cancel(token, actor, now),
    };

    let pending = match taken {
        Ok(pending) => pending,
        Err(e @ ConfirmError::NotRequester) => return ChoiceOutcome::Rejected(format!("❌ {e}")),
        Err(e) => return ChoiceOutcome::Finished(format!("❌ {e}")),
    };

    if choice == BanChoice::Cancel {
        return ChoiceOutcome::Finished("Ban cancelled.".to_string());
    }

    let user_id = pending.target.user_id;
    if let Err(e) = ensure_permission(actor_permissions, Permissions::BAN_MEMBERS) {
        return ChoiceOutcome::Finished(format!("❌ {e}"));
    }

    match api
        .ban(pending.target.guild_id, user_id, &pending.reason)
        .await
    {
        Ok(()) => {
            info!("(BanPrompt) {actor} confirmed ban of {user_id}");
            ChoiceOutcome::Finished(format!(
                "✅ <@{user_id}> banned. Reason: {}",
                pending.reason
            ))
        }
        Err(e) => ChoiceOutcome::Finished(format!("❌ Could not ban <@{user_id}>: {e}")),
    }
}

pub(crate) async fn handle_component(
    ctx: &CommandContext,
    interaction: &Interaction,
    custom_id: &str,
) -> Result<(), Error> {
    let Some((choice, token)) = parse_custom_id(custom_id) else {
        debug!("(BanPrompt) ignoring component {custom_id}");
        return Ok(());
    };

    let actor = interaction
        .author_id()
        .ok_or_else(|| Error::Platform("component interaction without an author".to_string()))?;

    if let Err(e) = ctx.confirmations.check_owner(token, actor) {
        return respond(ctx, interaction, &ephemeral_message(format!("❌ {e}"))).await;
    }
    if let Err(e) = ensure_guild(interaction.guild_id, ctx.guild_id) {
        return respond(ctx, interaction, &ephemeral_message(format!("❌ {e}"))).await;
    }

    let permissions = interaction.member.as_ref().and_then(|m| m.permissions);
    let outcome = resolve_choice(
        ctx.api.as_ref(),
        &ctx.confirmations,
        choice,
        token,
        actor,
        permissions,
        Instant::now(),
    )
    .await;

    let response = match outcome {
        ChoiceOutcome::Finished(content) => InteractionResponse {
            kind: InteractionResponseType::UpdateMessage,
            data: Some(
                InteractionResponseDataBuilder::new()
                    .content(content)
                    .components([buttons(token, true)])
                    .build(),
            ),
        },
        ChoiceOutcome::Rejected(content) => ephemeral_message(content),
    };

    respond(ctx, interaction, &response).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::MockModerationApi;
    use crate::services::discord::confirm::CONFIRMATION_TTL;

    fn target() -> TargetRef {
        TargetRef::new(Id::new(100), Id::new(200))
    }

    const REQUESTER: u64 = 1;

    #[test]
    fn custom_ids_round_trip_through_buttons() {
        let token = Uuid::new_v4();
        let Component::ActionRow(row) = buttons(token, false) else {
            panic!("expected an action row");
        };
        let ids: Vec<_> = row
            .components
            .iter()
            .filter_map(|c| match c {
                Component::Button(b) => b.custom_id.clone(),
                _ => None,
            })
            .collect();

        assert_eq!(parse_custom_id(&ids[0]), Some((BanChoice::Confirm, token)));
        assert_eq!(parse_custom_id(&ids[1]), Some((BanChoice::Cancel, token)));
        assert_eq!(parse_custom_id("ban:confirm:not-a-uuid"), None);
        assert_eq!(parse_custom_id("other"), None);
    }

    #[tokio::test]
    async fn requester_confirmation_bans_once() {
        let store = PendingConfirmations::default();
        let now = Instant::now();
        let token = store.request(Id::new(REQUESTER), target(), "raid".into(), now);

        let mut api = MockModerationApi::new();
        api.expect_ban()
            .withf(|guild, user, reason| {
                guild.get() == 100 && user.get() == 200 && reason.to_string() == "raid"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = resolve_choice(
            &api,
            &store,
            BanChoice::Confirm,
            token,
            Id::new(REQUESTER),
            Some(Permissions::BAN_MEMBERS),
            now,
        )
        .await;

        assert_eq!(
            outcome,
            ChoiceOutcome::Finished("✅ <@200> banned. Reason: raid".to_string())
        );
    }

    #[tokio::test]
    async fn other_actor_cannot_confirm() {
        let store = PendingConfirmations::default();
        let now = Instant::now();
        let token = store.request(Id::new(REQUESTER), target(), "raid".into(), now);

        let mut api = MockModerationApi::new();
        api.expect_ban().never();

        let outcome = resolve_choice(
            &api,
            &store,
            BanChoice::Confirm,
            token,
            Id::new(2),
            Some(Permissions::ADMINISTRATOR),
            now,
        )
        .await;

        assert!(matches!(outcome, ChoiceOutcome::Rejected(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn expired_prompt_cannot_ban() {
        let store = PendingConfirmations::default();
        let start = Instant::now();
        let token = store.request(Id::new(REQUESTER), target(), "raid".into(), start);

        let mut api = MockModerationApi::new();
        api.expect_ban().never();

        let outcome = resolve_choice(
            &api,
            &store,
            BanChoice::Confirm,
            token,
            Id::new(REQUESTER),
            Some(Permissions::BAN_MEMBERS),
            start + CONFIRMATION_TTL,
        )
        .await;

        assert_eq!(
            outcome,
            ChoiceOutcome::Finished(format!("❌ {}", ConfirmError::Expired))
        );
    }

    #[tokio::test]
    async fn cancel_consumes_without_banning() {
        let store = PendingConfirmations::default();
        let now = Instant::now();
        let token = store.request(Id::new(REQUESTER), target(), "raid".into(), now);

        let mut api = MockModerationApi::new();
        api.expect_ban().never();

        let outcome = resolve_choice(
            &api,
            &store,
            BanChoice::Cancel,
            token,
            Id::new(REQUESTER),
            None,
            now,
        )
        .await;

        assert_eq!(outcome, ChoiceOutcome::Finished("Ban cancelled.".to_string()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn requester_without_ban_permission_is_refused() {
        let store = PendingConfirmations::default();
        let now = Instant::now();
        let token = store.request(Id::new(REQUESTER), target(), "raid".into(), now);

        let mut api = MockModerationApi::new();
        api.expect_ban().never();

        let outcome = resolve_choice(
            &api,
            &store,
            BanChoice::Confirm,
            token,
            Id::new(REQUESTER),
            Some(Permissions::SEND_MESSAGES),
            now,
        )
        .await;

        let ChoiceOutcome::Finished(text) = outcome else {
            panic!("expected a finished prompt");
        };
        assert!(text.contains("Ban Members"));
    }
}
