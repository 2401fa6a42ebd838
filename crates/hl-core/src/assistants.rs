use crate::error::AssistantError;
use crate::types::{Assistant, AssistantId};
use chrono::{DateTime, Utc};

pub trait AssistantRepository {
    fn create(&self, id: AssistantId) -> Result<Assistant, AssistantError>;
    fn get(&self, id: AssistantId) -> Result<Option<Assistant>, AssistantError>;
    /// On-shift, not busy, and not in the exclude list.
    fn list_available(&self, exclude: &[AssistantId]) -> Result<Vec<Assistant>, AssistantError>;
    fn set_busy(&self, id: AssistantId, busy: bool) -> Result<Assistant, AssistantError>;
    fn set_working(&self, id: AssistantId, working: bool) -> Result<Assistant, AssistantError>;
    fn touch(&self, id: AssistantId, at: DateTime<Utc>) -> Result<Assistant, AssistantError>;
    fn add_coins(&self, id: AssistantId, amount: i64) -> Result<Assistant, AssistantError>;
}
