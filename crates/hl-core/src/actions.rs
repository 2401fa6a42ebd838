use crate::error::RequestError;
use crate::types::{ActionKind, AssistantId, RequestAction, RequestId};
use chrono::{DateTime, Utc};

/// Append-only audit log of rejections and ignores; the penalty ledger reads
/// from here and nothing ever updates a row.
pub trait ActionRepository {
    fn append(
        &self,
        request_id: &RequestId,
        assistant_id: AssistantId,
        action: ActionKind,
    ) -> Result<RequestAction, RequestError>;
    fn list_for_assistant_since(
        &self,
        assistant_id: AssistantId,
        since: DateTime<Utc>,
    ) -> Result<Vec<RequestAction>, RequestError>;
}
