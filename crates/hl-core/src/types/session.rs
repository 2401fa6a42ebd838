use crate::types::enums::Party;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transient per-actor interaction state, persisted so it survives restarts
/// and is shared across service instances. Currently carries the moderator
/// direct-message compose flow; reads past `expires_at` see nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSession {
    pub actor_id: i64,
    pub role: Party,
    pub state: SessionState,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionState {
    AwaitingTargetId { target_role: Party },
    AwaitingMessage { target_role: Party, target_id: i64 },
}
