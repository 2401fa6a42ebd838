use crate::types::enums::RequestStatus;
use crate::types::ids::{AssistantId, RequestId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's pending or active help request.
///
/// `updated_at` doubles as the offer timestamp: for a Pending request with an
/// assigned assistant it records when that assistant was offered the work,
/// which is what the sweeper compares against the offer timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRequest {
    pub id: RequestId,
    pub user_id: UserId,
    pub assistant_id: Option<AssistantId>,
    pub status: RequestStatus,
    pub is_active: bool,
    pub ignored_assistants: Vec<AssistantId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAction {
    pub id: crate::types::ids::ActionId,
    pub request_id: RequestId,
    pub assistant_id: AssistantId,
    pub action: crate::types::enums::ActionKind,
    pub created_at: DateTime<Utc>,
}
