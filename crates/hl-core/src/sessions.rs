use crate::error::SessionError;
use crate::types::{ActorSession, Party, SessionState};
use chrono::{DateTime, Utc};

pub trait ActorSessionRepository {
    fn put(
        &self,
        actor_id: i64,
        role: Party,
        state: SessionState,
        expires_at: DateTime<Utc>,
    ) -> Result<ActorSession, SessionError>;
    /// Sessions past their expiry read as absent.
    fn get(
        &self,
        actor_id: i64,
        role: Party,
        now: DateTime<Utc>,
    ) -> Result<Option<ActorSession>, SessionError>;
    fn clear(&self, actor_id: i64, role: Party) -> Result<(), SessionError>;
    fn cleanup(&self, now: DateTime<Utc>) -> Result<u64, SessionError>;
}
