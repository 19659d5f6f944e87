// File: wardenbot-core/src/config.rs

use std::time::Duration;

use tracing::warn;
use twilight_model::id::Id;
use twilight_model::id::marker::{GuildMarker, UserMarker};
use wardenbot_common::models::{IntentsMode, TargetRef};

use crate::Error;
use crate::invoker::DEFAULT_INVOKE_TIMEOUT;

pub const ENV_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_GUILD_ID: &str = "GUILD_ID";
pub const ENV_TARGET_USER_ID: &str = "TARGET_USER_ID";
pub const ENV_CLIENT_ID: &str = "CLIENT_ID";
pub const ENV_PRIVILEGED_INTENTS: &str = "WARDENBOT_PRIVILEGED_INTENTS";
pub const ENV_INVOKE_TIMEOUT: &str = "WARDENBOT_INVOKE_TIMEOUT_SECS";

/// Everything the bot needs, read once at startup and never changed after.
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub guild_id: Option<Id<GuildMarker>>,
    /// When set, every command is locked to this one member.
    pub target_user_id: Option<Id<UserMarker>>,
    /// Shown in the dashboard only.
    pub client_id: Option<String>,
    pub intents_mode: IntentsMode,
    pub invoke_timeout: Duration,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("guild_id", &self.guild_id)
            .field("target_user_id", &self.target_user_id)
            .field("client_id", &self.client_id)
            .field("intents_mode", &self.intents_mode)
            .field("invoke_timeout", &self.invoke_timeout)
            .finish()
    }
}

impl BotConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, Error> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(ENV_TOKEN)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{ENV_TOKEN} is missing; set it in the environment or .env"))
            })?;

        let guild_id = parse_snowflake::<GuildMarker>(ENV_GUILD_ID, lookup(ENV_GUILD_ID))?;
        let target_user_id =
            parse_snowflake::<UserMarker>(ENV_TARGET_USER_ID, lookup(ENV_TARGET_USER_ID))?;

        let client_id = lookup(ENV_CLIENT_ID)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let intents_mode = match lookup(ENV_PRIVILEGED_INTENTS) {
            Some(raw) => IntentsMode::from_flag(parse_bool(ENV_PRIVILEGED_INTENTS, &raw)?),
            None => IntentsMode::Standard,
        };

        let invoke_timeout = match lookup(ENV_INVOKE_TIMEOUT) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| {
                    Error::Config(format!("{ENV_INVOKE_TIMEOUT}={raw:?} is not a number of seconds: {e}"))
                })?;
                if secs == 0 {
                    return Err(Error::Config(format!("{ENV_INVOKE_TIMEOUT} must be at least 1")));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_INVOKE_TIMEOUT,
        };

        let config = Self {
            token,
            guild_id,
            target_user_id,
            client_id,
            intents_mode,
            invoke_timeout,
        };

        if config.guild_id.is_none() || config.target_user_id.is_none() {
            warn!(
                "{ENV_GUILD_ID} or {ENV_TARGET_USER_ID} missing => dashboard actions are blocked"
            );
        }

        Ok(config)
    }

    /// The fixed member the dashboard buttons act on.
    pub fn target(&self) -> Option<TargetRef> {
        match (self.guild_id, self.target_user_id) {
            (Some(guild_id), Some(user_id)) => Some(TargetRef::new(guild_id, user_id)),
            _ => None,
        }
    }
}

/// Empty or `0` counts as "not configured".
fn parse_snowflake<T>(name: &str, raw: Option<String>) -> Result<Option<Id<T>>, Error> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: u64 = trimmed
        .parse()
        .map_err(|e| Error::Config(format!("{name}={raw:?} is not a numeric ID: {e}")))?;
    Ok(Id::new_checked(value))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!("{name}={other:?} is not a boolean"))),
    }
}
