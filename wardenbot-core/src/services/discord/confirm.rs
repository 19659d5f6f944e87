//! Pending ban confirmations created by `/ban`.
//!
//! A prompt belongs to the member who ran the command and lives for
//! [`CONFIRMATION_TTL`]. Accepting or cancelling consumes it.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;
use uuid::Uuid;
use wardenbot_common::models::TargetRef;

pub const CONFIRMATION_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBan {
    pub requester_id: Id<UserMarker>,
    pub target: TargetRef,
    pub reason: String,
    pub created_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfirmError {
    #[error("This ban request no longer exists.")]
    Unknown,
    #[error("You did not request this ban.")]
    NotRequester,
    #[error("This ban request expired.")]
    Expired,
}

pub struct PendingConfirmations {
    pending: DashMap<Uuid, PendingBan>,
    ttl: Duration,
}

impl Default for PendingConfirmations {
    fn default() -> Self {
        Self::new(CONFIRMATION_TTL)
    }
}

impl PendingConfirmations {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            ttl,
        }
    }

    /// Stores a new prompt and returns the token its buttons carry.
    pub fn request(
        &self,
        requester_id: Id<UserMarker>,
        target: TargetRef,
        reason: String,
        now: Instant,
    ) -> Uuid {
        self.purge_expired(now);
        let token = Uuid::new_v4();
        self.pending.insert(
            token,
            PendingBan {
                requester_id,
                target,
                reason,
                created_at: now,
            },
        );
        token
    }

    pub fn accept(
        &self,
        token: Uuid,
        actor: Id<UserMarker>,
        now: Instant,
    ) -> Result<PendingBan, ConfirmError> {
        self.take(token, actor, now)
    }

    pub fn cancel(
        &self,
        token: Uuid,
        actor: Id<UserMarker>,
        now: Instant,
    ) -> Result<PendingBan, ConfirmError> {
        self.take(token, actor, now)
    }

    /// Fails with [`ConfirmError::NotRequester`] when the prompt exists and
    /// belongs to someone else. Never consumes the prompt.
    pub fn check_owner(&self, token: Uuid, actor: Id<UserMarker>) -> Result<(), ConfirmError> {
        match self.pending.get(&token) {
            Some(entry) if entry.requester_id != actor => Err(ConfirmError::NotRequester),
            _ => Ok(()),
        }
    }

    /// Removes and returns the prompt if `actor` owns it and it is still live.
    /// A wrong actor leaves the prompt in place.
    fn take(
        &self,
        token: Uuid,
        actor: Id<UserMarker>,
        now: Instant,
    ) -> Result<PendingBan, ConfirmError> {
        let (expired, owner) = {
            let entry = self.pending.get(&token).ok_or(ConfirmError::Unknown)?;
            (self.is_expired(&entry, now), entry.requester_id)
        };

        if expired {
            debug!("(PendingConfirmations) {token} expired => dropping");
            self.pending.remove(&token);
            return Err(ConfirmError::Expired);
        }
        if owner != actor {
            return Err(ConfirmError::NotRequester);
        }

        self.pending
            .remove(&token)
            .map(|(_, pending)| pending)
            .ok_or(ConfirmError::Unknown)
    }

    pub fn purge_expired(&self, now: Instant) {
        let ttl = self.ttl;
        self.pending
            .retain(|_, pending| now.saturating_duration_since(pending.created_at) < ttl);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn is_expired(&self, pending: &PendingBan, now: Instant) -> bool {
        now.saturating_duration_since(pending.created_at) >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetRef {
        TargetRef::new(Id::new(10), Id::new(20))
    }

    #[test]
    fn requester_can_accept_once() {
        let store = PendingConfirmations::default();
        let now = Instant::now();
        let token = store.request(Id::new(1), target(), "spam".into(), now);

        let pending = store.accept(token, Id::new(1), now).unwrap();
        assert_eq!(pending.target, target());
        assert_eq!(pending.reason, "spam");

        assert_eq!(store.accept(token, Id::new(1), now), Err(ConfirmError::Unknown));
    }

    #[test]
    fn other_actor_is_rejected_and_prompt_survives() {
        let store = PendingConfirmations::default();
        let now = Instant::now();
        let token = store.request(Id::new(1), target(), String::new(), now);

        assert_eq!(store.accept(token, Id::new(2), now), Err(ConfirmError::NotRequester));
        assert_eq!(store.cancel(token, Id::new(2), now), Err(ConfirmError::NotRequester));
        assert_eq!(store.len(), 1);

        assert!(store.accept(token, Id::new(1), now).is_ok());
    }

    #[test]
    fn owner_check_leaves_the_prompt_pending() {
        let store = PendingConfirmations::default();
        let now = Instant::now();
        let token = store.request(Id::new(1), target(), String::new(), now);

        assert_eq!(store.check_owner(token, Id::new(1)), Ok(()));
        assert_eq!(store.check_owner(token, Id::new(2)), Err(ConfirmError::NotRequester));
        assert_eq!(store.check_owner(Uuid::new_v4(), Id::new(2)), Ok(()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn prompt_expires_after_ttl() {
        let store = PendingConfirmations::default();
        let start = Instant::now();
        let token = store.request(Id::new(1), target(), String::new(), start);

        let later = start + CONFIRMATION_TTL;
        assert_eq!(store.accept(token, Id::new(1), later), Err(ConfirmError::Expired));
        assert!(store.is_empty());
    }

    #[test]
    fn just_before_ttl_still_counts() {
        let store = PendingConfirmations::default();
        let start = Instant::now();
        let token = store.request(Id::new(1), target(), String::new(), start);

        let almost = start + CONFIRMATION_TTL - Duration::from_millis(1);
        assert!(store.accept(token, Id::new(1), almost).is_ok());
    }

    #[test]
    fn new_requests_sweep_stale_ones() {
        let store = PendingConfirmations::new(Duration::from_secs(1));
        let start = Instant::now();
        store.request(Id::new(1), target(), String::new(), start);
        store.request(Id::new(1), target(), String::new(), start + Duration::from_secs(5));
        assert_eq!(store.len(), 1);
    }
}
