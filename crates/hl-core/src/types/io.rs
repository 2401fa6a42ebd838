use crate::types::ids::{ArbitrationId, AssistantId, ConversationId, RequestId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenArbitrationInput {
    pub user_id: UserId,
    pub user_nickname: String,
    pub assistant_id: AssistantId,
    pub assistant_nickname: String,
    pub reason: String,
}

/// The transport addresses a dialog either by the request it knows from the
/// offer flow or by the conversation it relays messages through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogRef {
    Request(RequestId),
    Conversation(ConversationId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSource {
    Conversation(ConversationId),
    Arbitration(ArbitrationId),
}

/// Outcome counters of one sweeper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Stale conversations closed as implicit completions.
    pub completed: u32,
    /// Stale conversations sent back through the reassignment path.
    pub reassigned: u32,
    /// Pending offers past the offer timeout, logged as Ignored.
    pub offers_expired: u32,
    /// Unassigned pending requests for which selection was retried.
    pub revisited: u32,
    /// Expired actor sessions deleted.
    pub sessions_expired: u64,
    /// Items skipped because their per-item transaction failed.
    pub failed: u32,
}

impl SweepReport {
    /// Conversations whose fate the sweep decided, the number the spec's
    /// `sweepTimeouts` contract reports.
    pub fn resolved(&self) -> u32 {
        self.completed + self.reassigned
    }
}
