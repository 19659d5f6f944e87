use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};
use twilight_cache_inmemory::InMemoryCache;
use twilight_gateway::{Event, EventTypeFlags, Shard, ShardId, StreamExt};
use twilight_http::Client as HttpClient;
use twilight_model::user::CurrentUser;
use wardenbot_common::models::{IntentsMode, SharedStatus};

use crate::Error;
use crate::config::BotConfig;
use crate::platforms::ModerationApi;
use crate::services::discord::confirm::PendingConfirmations;
use crate::services::discord::slashcommands::{
    CommandContext, handle_interaction_create, register_moderation_commands,
};

/// Everything the gateway loop owns for the lifetime of one worker.
pub(crate) struct GatewayContext {
    pub config: Arc<BotConfig>,
    pub mode: IntentsMode,
    pub http: Arc<HttpClient>,
    pub cache: Arc<InMemoryCache>,
    pub api: Arc<dyn ModerationApi>,
    pub status: SharedStatus,
    pub confirmations: Arc<PendingConfirmations>,
}

/// Close codes after which the gateway will not let us back in without an
/// operator fixing something first.
pub fn fatal_close_error(code: u16, mode: IntentsMode) -> Option<Error> {
    match code {
        4004 => Some(Error::Auth(
            "Discord rejected the token (close code 4004). Regenerate DISCORD_TOKEN in the \
             Developer Portal, update it and press Start again."
                .to_string(),
        )),
        4013 => Some(Error::Platform(format!(
            "Discord reported invalid intents (close code 4013) for {mode} mode."
        ))),
        4014 => Some(Error::PrivilegedIntent(
            "Discord refused the Server Members intent (close code 4014). Enable it under \
             Bot -> Privileged Gateway Intents in the Developer Portal, or turn elevated \
             membership access off, then press Start again."
                .to_string(),
        )),
        4010..=4012 => Some(Error::Platform(format!(
            "Discord closed the gateway with fatal code {code}."
        ))),
        _ => None,
    }
}

/// Human-readable reason the worker could not come up, with what to do next.
pub fn startup_failure_message(err: &Error) -> String {
    match err {
        Error::Auth(_) => format!(
            "Discord rejected DISCORD_TOKEN ({err}). Regenerate the bot token in the \
             Developer Portal, update the secret and press Start again."
        ),
        _ => format!("Could not reach Discord: {err}. Press Start to try again."),
    }
}

async fn fetch_current_user(http: &HttpClient) -> Result<CurrentUser, Error> {
    Ok(http.current_user().await?.model().await?)
}

/// Writes the status side of a gateway event.
///
///   - READY => connected with the bot identity,
///   - RESUMED => connected again,
///   - gateway close => disconnected, or failed with a hint for fatal codes.
///
/// `Break` means the close was fatal and the shard must not reconnect.
pub(crate) fn apply_lifecycle_event(
    status: &SharedStatus,
    event: &Event,
    mode: IntentsMode,
) -> ControlFlow<()> {
    match event {
        Event::Ready(ready) => {
            let identity = format!("{} ({})", ready.user.name, ready.user.id);
            info!("(DiscordGateway) READY as {identity}");
            status.mark_connected(identity);
        }
        Event::Resumed => {
            info!("(DiscordGateway) session resumed");
            status.mark_resumed();
        }
        Event::GatewayClose(frame) => {
            let code = frame.as_ref().map(|f| f.code);
            if let Some(err) = code.and_then(|c| fatal_close_error(c, mode)) {
                error!("(DiscordGateway) fatal close => {err}");
                status.mark_failed(err.to_string());
                return ControlFlow::Break(());
            }
            warn!("(DiscordGateway) gateway closed (code {code:?}); waiting for reconnect");
            status.mark_disconnected();
        }
        _ => {}
    }
    ControlFlow::Continue(())
}

/// Runs one shard until the connection ends for good. A token rejected
/// before connecting marks the status failed without opening the shard.
pub(crate) async fn run_gateway(ctx: GatewayContext) {
    let GatewayContext {
        config,
        mode,
        http,
        cache,
        api,
        status,
        confirmations,
    } = ctx;

    match fetch_current_user(&http).await {
        Ok(user) => {
            info!("(DiscordGateway) token accepted for {} ({})", user.name, user.id);
        }
        Err(err) => {
            error!("(DiscordGateway) startup failed => {err}");
            status.mark_failed(startup_failure_message(&err));
            return;
        }
    }

    let mut shard = Shard::new(ShardId::ONE, config.token.clone(), mode.intents());
    let mut commands: Option<Arc<CommandContext>> = None;

    info!("(DiscordGateway) shard started with {mode} intents. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                warn!("(DiscordGateway) error receiving event: {err:?}");
                continue;
            }
        };

        cache.update(&event);

        if apply_lifecycle_event(&status, &event, mode).is_break() {
            break;
        }

        match event {
            Event::Ready(ready) => {
                let command_ctx = Arc::new(CommandContext {
                    http: http.clone(),
                    application_id: ready.application.id,
                    guild_id: config.guild_id,
                    target_user_id: config.target_user_id,
                    api: api.clone(),
                    confirmations: confirmations.clone(),
                });
                match register_moderation_commands(&command_ctx).await {
                    Ok(()) => info!("(DiscordGateway) slash commands synced"),
                    Err(e) => warn!("(DiscordGateway) slash command sync failed => {e}"),
                }
                commands = Some(command_ctx);
            }
            Event::InteractionCreate(interaction) => {
                let Some(command_ctx) = commands.clone() else {
                    debug!("(DiscordGateway) interaction before READY => ignored");
                    continue;
                };
                tokio::spawn(async move {
                    if let Err(e) = handle_interaction_create(&command_ctx, &interaction.0).await {
                        error!("(DiscordGateway) interaction failed => {e}");
                    }
                });
            }
            Event::Resumed | Event::GatewayClose(_) => {}
            other => {
                trace!("(DiscordGateway) unhandled event: {:?}", other.kind());
            }
        }
    }

    warn!("(DiscordGateway) event loop ended.");
    status.mark_disconnected();
}

#[cfg(test)]
mod tests {
    use super::*;
    use twilight_model::gateway::CloseFrame;
    use twilight_model::gateway::payload::incoming::Ready;
    use twilight_model::id::Id;
    use twilight_model::oauth::{ApplicationFlags, PartialApplication};

    fn ready_event() -> Event {
        Event::Ready(Box::new(Ready {
            application: PartialApplication {
                flags: ApplicationFlags::empty(),
                id: Id::new(99),
            },
            guilds: Vec::new(),
            resume_gateway_url: "wss://gateway.discord.gg".to_string(),
            session_id: "session".to_string(),
            shard: Some(ShardId::ONE),
            user: CurrentUser {
                accent_color: None,
                avatar: None,
                banner: None,
                bot: true,
                discriminator: 0,
                email: None,
                flags: None,
                id: Id::new(42),
                locale: None,
                mfa_enabled: false,
                name: "warden".to_string(),
                premium_type: None,
                public_flags: None,
                verified: None,
            },
            version: 10,
        }))
    }

    fn close_event(code: u16) -> Event {
        Event::GatewayClose(Some(CloseFrame::new(code, "closed")))
    }

    #[test]
    fn ready_connects_with_identity() {
        let status = SharedStatus::new();
        status.mark_failed("previous run");

        let flow = apply_lifecycle_event(&status, &ready_event(), IntentsMode::Standard);

        assert!(flow.is_continue());
        let snap = status.snapshot();
        assert!(snap.connected);
        assert_eq!(snap.identity, "warden (42)");
        assert!(snap.last_error.is_empty());
    }

    #[test]
    fn ordinary_close_disconnects_and_resume_reconnects() {
        let status = SharedStatus::new();
        apply_lifecycle_event(&status, &ready_event(), IntentsMode::Standard);

        let flow = apply_lifecycle_event(&status, &close_event(4000), IntentsMode::Standard);
        assert!(flow.is_continue());
        let snap = status.snapshot();
        assert!(!snap.connected);
        assert_eq!(snap.identity, "warden (42)");

        let flow = apply_lifecycle_event(&status, &Event::Resumed, IntentsMode::Standard);
        assert!(flow.is_continue());
        assert!(status.is_connected());

        let flow = apply_lifecycle_event(&status, &Event::GatewayClose(None), IntentsMode::Standard);
        assert!(flow.is_continue());
        assert!(!status.is_connected());
    }

    #[test]
    fn disallowed_intents_close_fails_and_stops_the_loop() {
        let status = SharedStatus::new();
        apply_lifecycle_event(&status, &ready_event(), IntentsMode::Privileged);

        let flow = apply_lifecycle_event(&status, &close_event(4014), IntentsMode::Privileged);

        assert!(flow.is_break());
        let snap = status.snapshot();
        assert!(!snap.connected);
        assert!(snap.last_error.contains("Server Members"));
    }

    #[test]
    fn disallowed_intents_is_a_privileged_intent_error() {
        let err = fatal_close_error(4014, IntentsMode::Privileged).unwrap();
        assert!(matches!(err, Error::PrivilegedIntent(_)));
        assert!(err.to_string().contains("Server Members"));
    }

    #[test]
    fn bad_token_close_is_fatal() {
        assert!(matches!(
            fatal_close_error(4004, IntentsMode::Standard),
            Some(Error::Auth(_))
        ));
    }

    #[test]
    fn ordinary_closes_are_not_fatal() {
        for code in [1000, 1001, 4000, 4007, 4009] {
            assert!(fatal_close_error(code, IntentsMode::Standard).is_none(), "code {code}");
        }
    }

    #[test]
    fn startup_hint_depends_on_cause() {
        let auth = startup_failure_message(&Error::Auth("401 Unauthorized".into()));
        assert!(auth.contains("Regenerate"));

        let other = startup_failure_message(&Error::Http("connection refused".into()));
        assert!(other.starts_with("Could not reach Discord"));
    }
}
