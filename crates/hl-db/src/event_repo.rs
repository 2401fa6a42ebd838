use crate::util::{decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, to_rfc3339};
use hl_core::error::HelplineError;
use hl_core::events::EventRepository;
use hl_events::types::EventRecord;
use rusqlite::Connection;
use ulid::Ulid;

pub struct EventRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> EventRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> HelplineError {
    HelplineError::Internal {
        message: err.to_string(),
    }
}

fn internal(message: String) -> HelplineError {
    HelplineError::Internal { message }
}

impl<'a> EventRepository for EventRepo<'a> {
    fn append(&self, mut event: EventRecord) -> Result<EventRecord, HelplineError> {
        event.seq = next_seq(self.conn)?;
        event.id = format!("evt_{}", Ulid::new());
        let sql = "INSERT INTO events (id, seq, at, correlation_id, source, body_json) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        self.conn
            .execute(
                sql,
                (
                    event.id.clone(),
                    event.seq,
                    to_rfc3339(&event.at),
                    event.correlation_id.clone(),
                    encode_enum(&event.source).map_err(|err| internal(err.to_string()))?,
                    encode_json(&event.body).map_err(|err| internal(err.to_string()))?,
                ),
            )
            .map_err(store_err)?;
        Ok(event)
    }

    fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, HelplineError> {
        let mut sql =
            "SELECT id, seq, at, correlation_id, source, body_json FROM events".to_string();
        if after.is_some() {
            sql.push_str(" WHERE seq > ?1");
        }
        sql.push_str(" ORDER BY seq ASC");
        if limit.is_some() {
            sql.push_str(if after.is_some() { " LIMIT ?2" } else { " LIMIT ?1" });
        }

        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = match (after, limit) {
            (Some(after), Some(limit)) => stmt
                .query(rusqlite::params![after, limit])
                .map_err(store_err)?,
            (Some(after), None) => stmt.query(rusqlite::params![after]).map_err(store_err)?,
            (None, Some(limit)) => stmt.query(rusqlite::params![limit]).map_err(store_err)?,
            (None, None) => stmt.query([]).map_err(store_err)?,
        };
        let mut events = Vec::new();
        while let Some(row) = rows.next().map_err(store_err)? {
            events.push(map_event_row(row)?);
        }
        Ok(events)
    }
}

fn map_event_row(row: &rusqlite::Row<'_>) -> Result<EventRecord, HelplineError> {
    let id: String = row.get(0).map_err(store_err)?;
    let seq: i64 = row.get(1).map_err(store_err)?;
    let at: String = row.get(2).map_err(store_err)?;
    let correlation_id: Option<String> = row.get(3).map_err(store_err)?;
    let source: String = row.get(4).map_err(store_err)?;
    let body_json: String = row.get(5).map_err(store_err)?;

    Ok(EventRecord {
        id,
        seq,
        at: from_rfc3339(&at).map_err(|err| internal(err.to_string()))?,
        correlation_id,
        source: decode_enum(&source).map_err(|err| internal(err.to_string()))?,
        body: decode_json(&body_json).map_err(|err| internal(err.to_string()))?,
    })
}

fn next_seq(conn: &Connection) -> Result<i64, HelplineError> {
    let mut stmt = conn
        .prepare("SELECT COALESCE(MAX(seq), 0) FROM events")
        .map_err(store_err)?;
    let seq: i64 = stmt.query_row([], |row| row.get(0)).map_err(store_err)?;
    Ok(seq + 1)
}
