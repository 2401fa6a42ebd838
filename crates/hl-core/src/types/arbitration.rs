use crate::types::enums::ArbitrationStatus;
use crate::types::ids::{ArbitrationId, AssistantId, ModeratorId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dispute escalated to the moderator pool. At most one arbitration per
/// (user, assistant) pair may be Pending or InProgress at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arbitration {
    pub id: ArbitrationId,
    pub user_id: UserId,
    pub user_nickname: String,
    pub assistant_id: AssistantId,
    pub assistant_nickname: String,
    pub moderator_id: Option<ModeratorId>,
    pub status: ArbitrationStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moderator {
    pub id: ModeratorId,
    pub login: String,
    pub password_hash: String,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
