use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use chrono::{DateTime, Utc};
use hl_core::actions::ActionRepository;
use hl_core::error::RequestError;
use hl_core::types::{ActionId, ActionKind, AssistantId, RequestAction, RequestId};
use rusqlite::Connection;

pub struct ActionRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ActionRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> RequestError {
    RequestError::Store {
        message: err.to_string(),
    }
}

impl<'a> ActionRepository for ActionRepo<'a> {
    fn append(
        &self,
        request_id: &RequestId,
        assistant_id: AssistantId,
        action: ActionKind,
    ) -> Result<RequestAction, RequestError> {
        let record = RequestAction {
            id: ActionId::generate(),
            request_id: request_id.clone(),
            assistant_id,
            action,
            created_at: Utc::now(),
        };
        let sql = "INSERT INTO request_actions (id, request_id, assistant_id, action, created_at) VALUES (?1, ?2, ?3, ?4, ?5)";
        self.conn
            .execute(
                sql,
                (
                    record.id.as_str(),
                    record.request_id.as_str(),
                    record.assistant_id.get(),
                    encode_enum(&record.action).map_err(|err| RequestError::InvalidInput {
                        message: err.to_string(),
                    })?,
                    to_rfc3339(&record.created_at),
                ),
            )
            .map_err(store_err)?;
        Ok(record)
    }

    fn list_for_assistant_since(
        &self,
        assistant_id: AssistantId,
        since: DateTime<Utc>,
    ) -> Result<Vec<RequestAction>, RequestError> {
        let sql = "SELECT id, request_id, assistant_id, action, created_at FROM request_actions WHERE assistant_id = ?1 AND created_at >= ?2 ORDER BY created_at ASC";
        let mut stmt = self.conn.prepare(sql).map_err(store_err)?;
        let mut rows = stmt
            .query((assistant_id.get(), to_rfc3339(&since)))
            .map_err(store_err)?;
        let mut actions = Vec::new();
        while let Some(row) = rows.next().map_err(store_err)? {
            actions.push(map_action_row(row)?);
        }
        Ok(actions)
    }
}

fn map_action_row(row: &rusqlite::Row<'_>) -> Result<RequestAction, RequestError> {
    let invalid = |message: String| RequestError::InvalidInput { message };

    let id: String = row.get(0).map_err(store_err)?;
    let request_id: String = row.get(1).map_err(store_err)?;
    let assistant_id: i64 = row.get(2).map_err(store_err)?;
    let action: String = row.get(3).map_err(store_err)?;
    let created_at: String = row.get(4).map_err(store_err)?;

    Ok(RequestAction {
        id: id
            .parse::<ActionId>()
            .map_err(|err| invalid(err.to_string()))?,
        request_id: request_id
            .parse::<RequestId>()
            .map_err(|err| invalid(err.to_string()))?,
        assistant_id: AssistantId::new(assistant_id),
        action: decode_enum(&action).map_err(|err| invalid(err.to_string()))?,
        created_at: from_rfc3339(&created_at).map_err(|err| invalid(err.to_string()))?,
    })
}
