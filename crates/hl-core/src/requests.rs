use crate::error::RequestError;
use crate::types::{AssistantId, RequestId, RequestStatus, SupportRequest, UserId};
use chrono::{DateTime, Utc};

pub trait RequestRepository {
    fn create(&self, user_id: UserId) -> Result<SupportRequest, RequestError>;
    fn get(&self, id: &RequestId) -> Result<Option<SupportRequest>, RequestError>;
    fn get_active_for_user(&self, user_id: UserId) -> Result<Option<SupportRequest>, RequestError>;
    /// Pending requests with an assigned assistant whose offer predates the
    /// cutoff.
    fn list_stale_offers(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SupportRequest>, RequestError>;
    /// Pending requests with no assistant assigned.
    fn list_unassigned(&self) -> Result<Vec<SupportRequest>, RequestError>;
    /// Re-point the request at a new candidate (or none), bumping
    /// `updated_at` so it records the offer time.
    fn assign(
        &self,
        id: &RequestId,
        assistant_id: Option<AssistantId>,
    ) -> Result<SupportRequest, RequestError>;
    fn set_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
        is_active: bool,
    ) -> Result<SupportRequest, RequestError>;
    fn set_ignored(
        &self,
        id: &RequestId,
        ignored: &[AssistantId],
    ) -> Result<SupportRequest, RequestError>;
}
