use std::fmt;

use twilight_model::gateway::Intents;

/// Capability set a worker connects with.
///
/// `Privileged` additionally requests `GUILD_MEMBERS`, which the bot owner
/// must enable by hand in the developer portal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IntentsMode {
    #[default]
    Standard,
    Privileged,
}

impl IntentsMode {
    pub fn from_flag(privileged: bool) -> Self {
        if privileged {
            IntentsMode::Privileged
        } else {
            IntentsMode::Standard
        }
    }

    pub fn is_privileged(self) -> bool {
        matches!(self, IntentsMode::Privileged)
    }

    pub fn intents(self) -> Intents {
        let base = Intents::GUILDS | Intents::GUILD_VOICE_STATES;
        match self {
            IntentsMode::Standard => base,
            IntentsMode::Privileged => base | Intents::GUILD_MEMBERS,
        }
    }
}

impl fmt::Display for IntentsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentsMode::Standard => write!(f, "standard"),
            IntentsMode::Privileged => write!(f, "privileged (server members)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_privileged_mode_requests_members() {
        assert!(!IntentsMode::Standard.intents().contains(Intents::GUILD_MEMBERS));
        assert!(IntentsMode::Privileged.intents().contains(Intents::GUILD_MEMBERS));
        assert!(IntentsMode::Standard.intents().contains(Intents::GUILD_VOICE_STATES));
    }
}
