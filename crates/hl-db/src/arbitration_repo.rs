use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use chrono::Utc;
use hl_core::arbitrations::ArbitrationRepository;
use hl_core::error::ArbitrationError;
use hl_core::types::{
    Arbitration, ArbitrationId, ArbitrationStatus, AssistantId, ModeratorId,
    OpenArbitrationInput, UserId,
};
use rusqlite::Connection;

const COLUMNS: &str = "id, user_id, user_nickname, assistant_id, assistant_nickname, moderator_id, status, reason, created_at, updated_at";

pub struct ArbitrationRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ArbitrationRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> ArbitrationError {
    ArbitrationError::Store {
        message: err.to_string(),
    }
}

impl<'a> ArbitrationRepository for ArbitrationRepo<'a> {
    fn create(&self, input: OpenArbitrationInput) -> Result<Arbitration, ArbitrationError> {
        let now = Utc::now();
        let arbitration = Arbitration {
            id: ArbitrationId::generate(),
            user_id: input.user_id,
            user_nickname: input.user_nickname,
            assistant_id: input.assistant_id,
            assistant_nickname: input.assistant_nickname,
            moderator_id: None,
            status: ArbitrationStatus::Pending,
            reason: input.reason,
            created_at: now,
            updated_at: now,
        };
        let sql = "INSERT INTO arbitrations (id, user_id, user_nickname, assistant_id, assistant_nickname, moderator_id, status, reason, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";
        self.conn
            .execute(
                sql,
                (
                    arbitration.id.as_str(),
                    arbitration.user_id.get(),
                    arbitration.user_nickname.clone(),
                    arbitration.assistant_id.get(),
                    arbitration.assistant_nickname.clone(),
                    arbitration.moderator_id.map(ModeratorId::get),
                    encode_enum(&arbitration.status).map_err(|err| {
                        ArbitrationError::Store {
                            message: err.to_string(),
                        }
                    })?,
                    arbitration.reason.clone(),
                    to_rfc3339(&arbitration.created_at),
                    to_rfc3339(&arbitration.updated_at),
                ),
            )
            .map_err(store_err)?;
        Ok(arbitration)
    }

    fn get(&self, id: &ArbitrationId) -> Result<Option<Arbitration>, ArbitrationError> {
        let sql = format!("SELECT {COLUMNS} FROM arbitrations WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([id.as_str()]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_arbitration_row(row).map(Some)
    }

    fn get_active_for_pair(
        &self,
        user_id: UserId,
        assistant_id: AssistantId,
    ) -> Result<Option<Arbitration>, ArbitrationError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM arbitrations WHERE user_id = ?1 AND assistant_id = ?2 AND status IN ('Pending', 'InProgress') LIMIT 1"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt
            .query((user_id.get(), assistant_id.get()))
            .map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_arbitration_row(row).map(Some)
    }

    fn claim(
        &self,
        id: &ArbitrationId,
        moderator_id: ModeratorId,
    ) -> Result<Arbitration, ArbitrationError> {
        // Compare-and-set: only a Pending row can be claimed, so the second
        // of two racing moderators updates nothing.
        let affected = self
            .conn
            .execute(
                "UPDATE arbitrations SET moderator_id = ?1, status = 'InProgress', updated_at = ?2 WHERE id = ?3 AND status = 'Pending'",
                (moderator_id.get(), to_rfc3339(&Utc::now()), id.as_str()),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return match self.get(id)? {
                Some(_) => Err(ArbitrationError::AlreadyClaimed),
                None => Err(ArbitrationError::NotFound),
            };
        }
        self.get(id)?.ok_or(ArbitrationError::NotFound)
    }

    fn resolve(&self, id: &ArbitrationId) -> Result<Arbitration, ArbitrationError> {
        let affected = self
            .conn
            .execute(
                "UPDATE arbitrations SET status = 'Resolved', updated_at = ?1 WHERE id = ?2 AND status = 'InProgress'",
                (to_rfc3339(&Utc::now()), id.as_str()),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return match self.get(id)? {
                Some(arbitration) => Err(ArbitrationError::InvalidState {
                    from: arbitration.status,
                }),
                None => Err(ArbitrationError::NotFound),
            };
        }
        self.get(id)?.ok_or(ArbitrationError::NotFound)
    }
}

fn map_arbitration_row(row: &rusqlite::Row<'_>) -> Result<Arbitration, ArbitrationError> {
    let invalid = |message: String| ArbitrationError::Store { message };

    let id: String = row.get(0).map_err(store_err)?;
    let user_id: i64 = row.get(1).map_err(store_err)?;
    let user_nickname: String = row.get(2).map_err(store_err)?;
    let assistant_id: i64 = row.get(3).map_err(store_err)?;
    let assistant_nickname: String = row.get(4).map_err(store_err)?;
    let moderator_id: Option<i64> = row.get(5).map_err(store_err)?;
    let status: String = row.get(6).map_err(store_err)?;
    let reason: String = row.get(7).map_err(store_err)?;
    let created_at: String = row.get(8).map_err(store_err)?;
    let updated_at: String = row.get(9).map_err(store_err)?;

    Ok(Arbitration {
        id: id
            .parse::<ArbitrationId>()
            .map_err(|err| invalid(err.to_string()))?,
        user_id: UserId::new(user_id),
        user_nickname,
        assistant_id: AssistantId::new(assistant_id),
        assistant_nickname,
        moderator_id: moderator_id.map(ModeratorId::new),
        status: decode_enum(&status).map_err(|err| invalid(err.to_string()))?,
        reason,
        created_at: from_rfc3339(&created_at).map_err(|err| invalid(err.to_string()))?,
        updated_at: from_rfc3339(&updated_at).map_err(|err| invalid(err.to_string()))?,
    })
}
