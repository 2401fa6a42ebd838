use crate::util::{from_rfc3339, to_rfc3339};
use chrono::{DateTime, Utc};
use hl_core::assistants::AssistantRepository;
use hl_core::error::AssistantError;
use hl_core::types::{Assistant, AssistantId};
use rusqlite::Connection;

const COLUMNS: &str = "id, is_working, is_busy, coins, last_active_at, created_at";

pub struct AssistantRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> AssistantRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> AssistantError {
    AssistantError::Store {
        message: err.to_string(),
    }
}

impl<'a> AssistantRepository for AssistantRepo<'a> {
    fn create(&self, id: AssistantId) -> Result<Assistant, AssistantError> {
        let now = Utc::now();
        let assistant = Assistant {
            id,
            is_working: false,
            is_busy: false,
            coins: 0,
            last_active_at: Some(now),
            created_at: now,
        };
        let sql = "INSERT INTO assistants (id, is_working, is_busy, coins, last_active_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        self.conn
            .execute(
                sql,
                (
                    assistant.id.get(),
                    assistant.is_working,
                    assistant.is_busy,
                    assistant.coins,
                    assistant.last_active_at.map(|at| to_rfc3339(&at)),
                    to_rfc3339(&assistant.created_at),
                ),
            )
            .map_err(store_err)?;
        Ok(assistant)
    }

    fn get(&self, id: AssistantId) -> Result<Option<Assistant>, AssistantError> {
        let sql = format!("SELECT {COLUMNS} FROM assistants WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([id.get()]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_assistant_row(row).map(Some)
    }

    fn list_available(&self, exclude: &[AssistantId]) -> Result<Vec<Assistant>, AssistantError> {
        let sql =
            format!("SELECT {COLUMNS} FROM assistants WHERE is_working = 1 AND is_busy = 0");
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([]).map_err(store_err)?;
        let mut assistants = Vec::new();
        while let Some(row) = rows.next().map_err(store_err)? {
            let assistant = map_assistant_row(row)?;
            if !exclude.contains(&assistant.id) {
                assistants.push(assistant);
            }
        }
        Ok(assistants)
    }

    fn set_busy(&self, id: AssistantId, busy: bool) -> Result<Assistant, AssistantError> {
        // Taking a dialog implies being on shift.
        let sql = if busy {
            "UPDATE assistants SET is_busy = 1, is_working = 1 WHERE id = ?1"
        } else {
            "UPDATE assistants SET is_busy = 0 WHERE id = ?1"
        };
        let affected = self.conn.execute(sql, [id.get()]).map_err(store_err)?;
        if affected == 0 {
            return Err(AssistantError::NotFound);
        }
        self.get(id)?.ok_or(AssistantError::NotFound)
    }

    fn set_working(&self, id: AssistantId, working: bool) -> Result<Assistant, AssistantError> {
        let sql = if working {
            "UPDATE assistants SET is_working = 1 WHERE id = ?1"
        } else {
            "UPDATE assistants SET is_working = 0, is_busy = 0 WHERE id = ?1"
        };
        let affected = self.conn.execute(sql, [id.get()]).map_err(store_err)?;
        if affected == 0 {
            return Err(AssistantError::NotFound);
        }
        self.get(id)?.ok_or(AssistantError::NotFound)
    }

    fn touch(&self, id: AssistantId, at: DateTime<Utc>) -> Result<Assistant, AssistantError> {
        let affected = self
            .conn
            .execute(
                "UPDATE assistants SET last_active_at = ?1 WHERE id = ?2",
                (to_rfc3339(&at), id.get()),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return Err(AssistantError::NotFound);
        }
        self.get(id)?.ok_or(AssistantError::NotFound)
    }

    fn add_coins(&self, id: AssistantId, amount: i64) -> Result<Assistant, AssistantError> {
        let affected = self
            .conn
            .execute(
                "UPDATE assistants SET coins = coins + ?1 WHERE id = ?2",
                (amount, id.get()),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return Err(AssistantError::NotFound);
        }
        self.get(id)?.ok_or(AssistantError::NotFound)
    }
}

fn map_assistant_row(row: &rusqlite::Row<'_>) -> Result<Assistant, AssistantError> {
    let invalid = |message: String| AssistantError::Store { message };

    let id: i64 = row.get(0).map_err(store_err)?;
    let is_working: bool = row.get(1).map_err(store_err)?;
    let is_busy: bool = row.get(2).map_err(store_err)?;
    let coins: i64 = row.get(3).map_err(store_err)?;
    let last_active_at: Option<String> = row.get(4).map_err(store_err)?;
    let created_at: String = row.get(5).map_err(store_err)?;

    Ok(Assistant {
        id: AssistantId::new(id),
        is_working,
        is_busy,
        coins,
        last_active_at: last_active_at
            .map(|value| from_rfc3339(&value))
            .transpose()
            .map_err(|err| invalid(err.to_string()))?,
        created_at: from_rfc3339(&created_at).map_err(|err| invalid(err.to_string()))?,
    })
}
