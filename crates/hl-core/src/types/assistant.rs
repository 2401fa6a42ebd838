use crate::types::ids::{AssistantId, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A support worker. `is_busy` implies `is_working`, and a busy assistant
/// holds exactly one in-progress request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: AssistantId,
    pub is_working: bool,
    pub is_busy: bool,
    pub coins: i64,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Append-only reward ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinTransaction {
    pub id: TransactionId,
    pub assistant_id: AssistantId,
    pub amount: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
