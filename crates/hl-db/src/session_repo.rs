use crate::util::{decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, to_rfc3339};
use chrono::{DateTime, Utc};
use hl_core::error::SessionError;
use hl_core::sessions::ActorSessionRepository;
use hl_core::types::{ActorSession, Party, SessionState};
use rusqlite::Connection;

pub struct SessionRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> SessionRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> SessionError {
    SessionError::Store {
        message: err.to_string(),
    }
}

fn invalid(message: String) -> SessionError {
    SessionError::InvalidInput { message }
}

impl<'a> ActorSessionRepository for SessionRepo<'a> {
    fn put(
        &self,
        actor_id: i64,
        role: Party,
        state: SessionState,
        expires_at: DateTime<Utc>,
    ) -> Result<ActorSession, SessionError> {
        let session = ActorSession {
            actor_id,
            role,
            state,
            expires_at,
            updated_at: Utc::now(),
        };
        let sql = "INSERT INTO actor_sessions (actor_id, role, state, expires_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT (actor_id, role) DO UPDATE SET state = excluded.state, expires_at = excluded.expires_at, updated_at = excluded.updated_at";
        self.conn
            .execute(
                sql,
                (
                    session.actor_id,
                    encode_enum(&session.role).map_err(|err| invalid(err.to_string()))?,
                    encode_json(&session.state).map_err(|err| invalid(err.to_string()))?,
                    to_rfc3339(&session.expires_at),
                    to_rfc3339(&session.updated_at),
                ),
            )
            .map_err(store_err)?;
        Ok(session)
    }

    fn get(
        &self,
        actor_id: i64,
        role: Party,
        now: DateTime<Utc>,
    ) -> Result<Option<ActorSession>, SessionError> {
        let sql = "SELECT actor_id, role, state, expires_at, updated_at FROM actor_sessions WHERE actor_id = ?1 AND role = ?2 AND expires_at > ?3";
        let mut stmt = self.conn.prepare(sql).map_err(store_err)?;
        let mut rows = stmt
            .query((
                actor_id,
                encode_enum(&role).map_err(|err| invalid(err.to_string()))?,
                to_rfc3339(&now),
            ))
            .map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_session_row(row).map(Some)
    }

    fn clear(&self, actor_id: i64, role: Party) -> Result<(), SessionError> {
        self.conn
            .execute(
                "DELETE FROM actor_sessions WHERE actor_id = ?1 AND role = ?2",
                (
                    actor_id,
                    encode_enum(&role).map_err(|err| invalid(err.to_string()))?,
                ),
            )
            .map_err(store_err)?;
        Ok(())
    }

    fn cleanup(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let affected = self
            .conn
            .execute(
                "DELETE FROM actor_sessions WHERE expires_at <= ?1",
                [to_rfc3339(&now)],
            )
            .map_err(store_err)?;
        Ok(affected as u64)
    }
}

fn map_session_row(row: &rusqlite::Row<'_>) -> Result<ActorSession, SessionError> {
    let actor_id: i64 = row.get(0).map_err(store_err)?;
    let role: String = row.get(1).map_err(store_err)?;
    let state: String = row.get(2).map_err(store_err)?;
    let expires_at: String = row.get(3).map_err(store_err)?;
    let updated_at: String = row.get(4).map_err(store_err)?;

    Ok(ActorSession {
        actor_id,
        role: decode_enum(&role).map_err(|err| invalid(err.to_string()))?,
        state: decode_json(&state).map_err(|err| invalid(err.to_string()))?,
        expires_at: from_rfc3339(&expires_at).map_err(|err| invalid(err.to_string()))?,
        updated_at: from_rfc3339(&updated_at).map_err(|err| invalid(err.to_string()))?,
    })
}
