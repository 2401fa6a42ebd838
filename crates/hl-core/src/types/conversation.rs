use crate::types::enums::{ConversationStatus, Party};
use crate::types::ids::{AssistantId, ConversationId, RequestId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The live message-relay session bound to an accepted request. Exists in
/// `InProgress` only while the bound request is in progress; closing one
/// closes the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub request_id: RequestId,
    pub user_id: UserId,
    pub assistant_id: AssistantId,
    pub status: ConversationStatus,
    /// Sole signal the sweeper reads to decide completion vs. reassignment.
    pub last_message_from: Party,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
