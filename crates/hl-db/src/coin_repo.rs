use crate::util::{from_rfc3339, to_rfc3339};
use chrono::Utc;
use hl_core::coins::CoinLedgerRepository;
use hl_core::error::AssistantError;
use hl_core::types::{AssistantId, CoinTransaction, TransactionId};
use rusqlite::Connection;

pub struct CoinRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> CoinRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> AssistantError {
    AssistantError::Store {
        message: err.to_string(),
    }
}

impl<'a> CoinLedgerRepository for CoinRepo<'a> {
    fn append(
        &self,
        assistant_id: AssistantId,
        amount: i64,
        reason: &str,
    ) -> Result<CoinTransaction, AssistantError> {
        let transaction = CoinTransaction {
            id: TransactionId::generate(),
            assistant_id,
            amount,
            reason: reason.to_string(),
            created_at: Utc::now(),
        };
        let sql = "INSERT INTO coin_transactions (id, assistant_id, amount, reason, created_at) VALUES (?1, ?2, ?3, ?4, ?5)";
        self.conn
            .execute(
                sql,
                (
                    transaction.id.as_str(),
                    transaction.assistant_id.get(),
                    transaction.amount,
                    transaction.reason.clone(),
                    to_rfc3339(&transaction.created_at),
                ),
            )
            .map_err(store_err)?;
        Ok(transaction)
    }

    fn list_for_assistant(
        &self,
        assistant_id: AssistantId,
    ) -> Result<Vec<CoinTransaction>, AssistantError> {
        let sql = "SELECT id, assistant_id, amount, reason, created_at FROM coin_transactions WHERE assistant_id = ?1 ORDER BY created_at ASC";
        let mut stmt = self.conn.prepare(sql).map_err(store_err)?;
        let mut rows = stmt.query([assistant_id.get()]).map_err(store_err)?;
        let mut transactions = Vec::new();
        while let Some(row) = rows.next().map_err(store_err)? {
            let id: String = row.get(0).map_err(store_err)?;
            let assistant_id: i64 = row.get(1).map_err(store_err)?;
            let amount: i64 = row.get(2).map_err(store_err)?;
            let reason: String = row.get(3).map_err(store_err)?;
            let created_at: String = row.get(4).map_err(store_err)?;
            transactions.push(CoinTransaction {
                id: id
                    .parse::<TransactionId>()
                    .map_err(|err| AssistantError::Store {
                        message: err.to_string(),
                    })?,
                assistant_id: AssistantId::new(assistant_id),
                amount,
                reason,
                created_at: from_rfc3339(&created_at).map_err(|err| AssistantError::Store {
                    message: err.to_string(),
                })?,
            });
        }
        Ok(transactions)
    }
}
