use crate::util::{from_rfc3339, to_rfc3339};
use chrono::{DateTime, Utc};
use hl_core::error::ModeratorError;
use hl_core::moderators::ModeratorRepository;
use hl_core::types::{Moderator, ModeratorId};
use rusqlite::Connection;

const COLUMNS: &str = "id, login, password_hash, last_active_at, created_at";

pub struct ModeratorRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ModeratorRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> ModeratorError {
    ModeratorError::Store {
        message: err.to_string(),
    }
}

impl<'a> ModeratorRepository for ModeratorRepo<'a> {
    fn create(
        &self,
        id: ModeratorId,
        login: &str,
        password_hash: &str,
    ) -> Result<Moderator, ModeratorError> {
        let now = Utc::now();
        let moderator = Moderator {
            id,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            last_active_at: Some(now),
            created_at: now,
        };
        let sql = "INSERT INTO moderators (id, login, password_hash, last_active_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5)";
        self.conn
            .execute(
                sql,
                (
                    moderator.id.get(),
                    moderator.login.clone(),
                    moderator.password_hash.clone(),
                    moderator.last_active_at.map(|at| to_rfc3339(&at)),
                    to_rfc3339(&moderator.created_at),
                ),
            )
            .map_err(store_err)?;
        Ok(moderator)
    }

    fn get(&self, id: ModeratorId) -> Result<Option<Moderator>, ModeratorError> {
        let sql = format!("SELECT {COLUMNS} FROM moderators WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([id.get()]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_moderator_row(row).map(Some)
    }

    fn most_recently_active(&self) -> Result<Option<Moderator>, ModeratorError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM moderators ORDER BY last_active_at IS NULL, last_active_at DESC LIMIT 1"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_moderator_row(row).map(Some)
    }

    fn touch(&self, id: ModeratorId, at: DateTime<Utc>) -> Result<Moderator, ModeratorError> {
        let affected = self
            .conn
            .execute(
                "UPDATE moderators SET last_active_at = ?1 WHERE id = ?2",
                (to_rfc3339(&at), id.get()),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return Err(ModeratorError::NotFound);
        }
        self.get(id)?.ok_or(ModeratorError::NotFound)
    }
}

fn map_moderator_row(row: &rusqlite::Row<'_>) -> Result<Moderator, ModeratorError> {
    let invalid = |message: String| ModeratorError::Store { message };

    let id: i64 = row.get(0).map_err(store_err)?;
    let login: String = row.get(1).map_err(store_err)?;
    let password_hash: String = row.get(2).map_err(store_err)?;
    let last_active_at: Option<String> = row.get(3).map_err(store_err)?;
    let created_at: String = row.get(4).map_err(store_err)?;

    Ok(Moderator {
        id: ModeratorId::new(id),
        login,
        password_hash,
        last_active_at: last_active_at
            .map(|value| from_rfc3339(&value))
            .transpose()
            .map_err(|err| invalid(err.to_string()))?,
        created_at: from_rfc3339(&created_at).map_err(|err| invalid(err.to_string()))?,
    })
}
