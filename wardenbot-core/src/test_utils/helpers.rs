// File: wardenbot-core/src/test_utils/helpers.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};
use wardenbot_common::models::{GuildInfo, IntentsMode, MemberEdit, MemberInfo, SharedStatus, TargetRef};

use crate::Error;
use crate::platforms::ModerationApi;
use crate::platforms::discord::{BotWorker, WorkerFactory, worker_runtime};

/// One remote call as seen by [`RecordingModerationApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Guild(Id<GuildMarker>),
    Member(Id<GuildMarker>, Id<UserMarker>),
    Ban {
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        reason: String,
    },
    Edit {
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        edit: MemberEdit,
    },
    Move {
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        channel_id: Option<Id<ChannelMarker>>,
    },
}

impl ApiCall {
    /// True for calls that change something on the server.
    pub fn is_mutation(&self) -> bool {
        matches!(self, ApiCall::Ban { .. } | ApiCall::Edit { .. } | ApiCall::Move { .. })
    }
}

/// In-memory platform that records every call it receives.
#[derive(Default)]
pub struct RecordingModerationApi {
    guilds: HashMap<Id<GuildMarker>, String>,
    members: HashMap<(Id<GuildMarker>, Id<UserMarker>), MemberInfo>,
    calls: Mutex<Vec<ApiCall>>,
    delay: Option<Duration>,
}

impl RecordingModerationApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guild(mut self, guild_id: Id<GuildMarker>, name: &str) -> Self {
        self.guilds.insert(guild_id, name.to_string());
        self
    }

    pub fn with_member(mut self, target: TargetRef, username: &str, display_name: &str) -> Self {
        self.members.insert(
            (target.guild_id, target.user_id),
            MemberInfo {
                user_id: target.user_id,
                username: username.to_string(),
                display_name: display_name.to_string(),
            },
        );
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls().into_iter().filter(ApiCall::is_mutation).collect()
    }

    async fn record(&self, call: ApiCall) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ModerationApi for RecordingModerationApi {
    async fn guild(&self, guild_id: Id<GuildMarker>) -> Result<GuildInfo, Error> {
        self.record(ApiCall::Guild(guild_id)).await;
        self.guilds
            .get(&guild_id)
            .map(|name| GuildInfo {
                guild_id,
                name: name.clone(),
            })
            .ok_or_else(|| Error::NotFound(format!("Unknown Guild {guild_id}")))
    }

    async fn member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<MemberInfo, Error> {
        self.record(ApiCall::Member(guild_id, user_id)).await;
        self.members
            .get(&(guild_id, user_id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Unknown Member {user_id}")))
    }

    async fn ban(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        reason: &str,
    ) -> Result<(), Error> {
        self.record(ApiCall::Ban {
            guild_id,
            user_id,
            reason: reason.to_string(),
        })
        .await;
        Ok(())
    }

    async fn edit_member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        edit: MemberEdit,
        _reason: &str,
    ) -> Result<(), Error> {
        self.record(ApiCall::Edit {
            guild_id,
            user_id,
            edit,
        })
        .await;
        Ok(())
    }

    async fn move_member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
        channel_id: Option<Id<ChannelMarker>>,
    ) -> Result<(), Error> {
        self.record(ApiCall::Move {
            guild_id,
            user_id,
            channel_id,
        })
        .await;
        Ok(())
    }
}

/// Spawns workers that never touch the network.
///
/// With `connect` set the worker reports itself connected right away;
/// otherwise it stays alive but disconnected.
pub struct FakeWorkerFactory {
    api: Arc<RecordingModerationApi>,
    connect: bool,
    spawned: Arc<AtomicUsize>,
}

impl FakeWorkerFactory {
    pub fn new(api: Arc<RecordingModerationApi>, connect: bool) -> Self {
        Self {
            api,
            connect,
            spawned: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of how many workers were spawned.
    pub fn spawn_counter(&self) -> Arc<AtomicUsize> {
        self.spawned.clone()
    }
}

impl WorkerFactory for FakeWorkerFactory {
    fn spawn(&self, mode: IntentsMode, status: SharedStatus) -> Result<BotWorker, Error> {
        let runtime = worker_runtime()?;
        let api: Arc<dyn ModerationApi> = self.api.clone();
        let worker = BotWorker::start(runtime, mode, api, || std::future::pending::<()>())?;

        self.spawned.fetch_add(1, Ordering::SeqCst);
        if self.connect {
            status.mark_connected(format!("fake-warden ({mode})"));
        }
        Ok(worker)
    }
}
