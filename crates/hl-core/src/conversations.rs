use crate::error::ConversationError;
use crate::types::{
    AssistantId, Conversation, ConversationId, ConversationStatus, Party, RequestId, UserId,
};
use chrono::{DateTime, Utc};

pub trait ConversationRepository {
    fn open(
        &self,
        request_id: &RequestId,
        user_id: UserId,
        assistant_id: AssistantId,
    ) -> Result<Conversation, ConversationError>;
    fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, ConversationError>;
    fn get_by_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<Conversation>, ConversationError>;
    fn record_message(
        &self,
        id: &ConversationId,
        from: Party,
        at: DateTime<Utc>,
    ) -> Result<Conversation, ConversationError>;
    /// Idempotent: closing an already-closed conversation returns it
    /// unchanged.
    fn close(
        &self,
        id: &ConversationId,
        outcome: ConversationStatus,
    ) -> Result<Conversation, ConversationError>;
    /// In-progress conversations created before the cutoff.
    fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Conversation>, ConversationError>;
}
