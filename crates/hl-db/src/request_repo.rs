use crate::util::{decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, to_rfc3339};
use chrono::{DateTime, Utc};
use hl_core::error::RequestError;
use hl_core::requests::RequestRepository;
use hl_core::types::{AssistantId, RequestId, RequestStatus, SupportRequest, UserId};
use rusqlite::Connection;

const COLUMNS: &str =
    "id, user_id, assistant_id, status, is_active, ignored_assistants, created_at, updated_at";

pub struct RequestRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> RequestRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> RequestError {
    RequestError::Store {
        message: err.to_string(),
    }
}

impl<'a> RequestRepository for RequestRepo<'a> {
    fn create(&self, user_id: UserId) -> Result<SupportRequest, RequestError> {
        let now = Utc::now();
        let request = SupportRequest {
            id: RequestId::generate(),
            user_id,
            assistant_id: None,
            status: RequestStatus::Pending,
            is_active: true,
            ignored_assistants: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let sql = "INSERT INTO requests (id, user_id, assistant_id, status, is_active, ignored_assistants, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
        let params = (
            request.id.as_str(),
            request.user_id.get(),
            request.assistant_id.map(AssistantId::get),
            encode_enum(&request.status).map_err(|err| RequestError::InvalidInput {
                message: err.to_string(),
            })?,
            request.is_active,
            encode_json(&request.ignored_assistants).map_err(|err| {
                RequestError::InvalidInput {
                    message: err.to_string(),
                }
            })?,
            to_rfc3339(&request.created_at),
            to_rfc3339(&request.updated_at),
        );
        self.conn.execute(sql, params).map_err(store_err)?;
        Ok(request)
    }

    fn get(&self, id: &RequestId) -> Result<Option<SupportRequest>, RequestError> {
        let sql = format!("SELECT {COLUMNS} FROM requests WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([id.as_str()]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_request_row(row).map(Some)
    }

    fn get_active_for_user(&self, user_id: UserId) -> Result<Option<SupportRequest>, RequestError> {
        let sql = format!("SELECT {COLUMNS} FROM requests WHERE user_id = ?1 AND is_active = 1 LIMIT 1");
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([user_id.get()]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_request_row(row).map(Some)
    }

    fn list_stale_offers(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SupportRequest>, RequestError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM requests WHERE status = 'Pending' AND assistant_id IS NOT NULL AND updated_at < ?1 ORDER BY updated_at ASC"
        );
        self.query_many(&sql, &[&to_rfc3339(&cutoff)])
    }

    fn list_unassigned(&self) -> Result<Vec<SupportRequest>, RequestError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM requests WHERE status = 'Pending' AND assistant_id IS NULL ORDER BY created_at ASC"
        );
        self.query_many(&sql, &[])
    }

    fn assign(
        &self,
        id: &RequestId,
        assistant_id: Option<AssistantId>,
    ) -> Result<SupportRequest, RequestError> {
        let affected = self
            .conn
            .execute(
                "UPDATE requests SET assistant_id = ?1, updated_at = ?2 WHERE id = ?3",
                (
                    assistant_id.map(AssistantId::get),
                    to_rfc3339(&Utc::now()),
                    id.as_str(),
                ),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return Err(RequestError::NotFound);
        }
        self.get(id)?.ok_or(RequestError::NotFound)
    }

    fn set_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
        is_active: bool,
    ) -> Result<SupportRequest, RequestError> {
        let affected = self
            .conn
            .execute(
                "UPDATE requests SET status = ?1, is_active = ?2, updated_at = ?3 WHERE id = ?4",
                (
                    encode_enum(&status).map_err(|err| RequestError::InvalidInput {
                        message: err.to_string(),
                    })?,
                    is_active,
                    to_rfc3339(&Utc::now()),
                    id.as_str(),
                ),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return Err(RequestError::NotFound);
        }
        self.get(id)?.ok_or(RequestError::NotFound)
    }

    fn set_ignored(
        &self,
        id: &RequestId,
        ignored: &[AssistantId],
    ) -> Result<SupportRequest, RequestError> {
        let encoded = encode_json(&ignored).map_err(|err| RequestError::InvalidInput {
            message: err.to_string(),
        })?;
        let affected = self
            .conn
            .execute(
                "UPDATE requests SET ignored_assistants = ?1 WHERE id = ?2",
                (encoded, id.as_str()),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return Err(RequestError::NotFound);
        }
        self.get(id)?.ok_or(RequestError::NotFound)
    }
}

impl<'a> RequestRepo<'a> {
    fn query_many(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<SupportRequest>, RequestError> {
        let mut stmt = self.conn.prepare(sql).map_err(store_err)?;
        let mut rows = stmt.query(params).map_err(store_err)?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().map_err(store_err)? {
            requests.push(map_request_row(row)?);
        }
        Ok(requests)
    }
}

fn map_request_row(row: &rusqlite::Row<'_>) -> Result<SupportRequest, RequestError> {
    let invalid = |message: String| RequestError::InvalidInput { message };

    let id: String = row.get(0).map_err(store_err)?;
    let user_id: i64 = row.get(1).map_err(store_err)?;
    let assistant_id: Option<i64> = row.get(2).map_err(store_err)?;
    let status: String = row.get(3).map_err(store_err)?;
    let is_active: bool = row.get(4).map_err(store_err)?;
    let ignored: String = row.get(5).map_err(store_err)?;
    let created_at: String = row.get(6).map_err(store_err)?;
    let updated_at: String = row.get(7).map_err(store_err)?;

    Ok(SupportRequest {
        id: id
            .parse::<RequestId>()
            .map_err(|err| invalid(err.to_string()))?,
        user_id: UserId::new(user_id),
        assistant_id: assistant_id.map(AssistantId::new),
        status: decode_enum(&status).map_err(|err| invalid(err.to_string()))?,
        is_active,
        ignored_assistants: decode_json(&ignored).map_err(|err| invalid(err.to_string()))?,
        created_at: from_rfc3339(&created_at).map_err(|err| invalid(err.to_string()))?,
        updated_at: from_rfc3339(&updated_at).map_err(|err| invalid(err.to_string()))?,
    })
}
