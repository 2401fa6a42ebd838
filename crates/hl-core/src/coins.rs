use crate::error::AssistantError;
use crate::types::{AssistantId, CoinTransaction};

pub trait CoinLedgerRepository {
    fn append(
        &self,
        assistant_id: AssistantId,
        amount: i64,
        reason: &str,
    ) -> Result<CoinTransaction, AssistantError>;
    fn list_for_assistant(
        &self,
        assistant_id: AssistantId,
    ) -> Result<Vec<CoinTransaction>, AssistantError>;
}
