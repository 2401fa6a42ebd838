use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use chrono::{DateTime, Utc};
use hl_core::conversations::ConversationRepository;
use hl_core::error::ConversationError;
use hl_core::types::{
    AssistantId, Conversation, ConversationId, ConversationStatus, Party, RequestId, UserId,
};
use rusqlite::Connection;

const COLUMNS: &str =
    "id, request_id, user_id, assistant_id, status, last_message_from, created_at, updated_at";

pub struct ConversationRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ConversationRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> ConversationError {
    ConversationError::Store {
        message: err.to_string(),
    }
}

fn invalid(message: String) -> ConversationError {
    ConversationError::InvalidInput { message }
}

impl<'a> ConversationRepository for ConversationRepo<'a> {
    fn open(
        &self,
        request_id: &RequestId,
        user_id: UserId,
        assistant_id: AssistantId,
    ) -> Result<Conversation, ConversationError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: ConversationId::generate(),
            request_id: request_id.clone(),
            user_id,
            assistant_id,
            status: ConversationStatus::InProgress,
            // The assistant "spoke" last through the join notification; a
            // dialog the user never picks up sweeps as a quiet completion.
            last_message_from: Party::Assistant,
            created_at: now,
            updated_at: now,
        };
        let sql = "INSERT INTO conversations (id, request_id, user_id, assistant_id, status, last_message_from, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
        self.conn
            .execute(
                sql,
                (
                    conversation.id.as_str(),
                    conversation.request_id.as_str(),
                    conversation.user_id.get(),
                    conversation.assistant_id.get(),
                    encode_enum(&conversation.status).map_err(|err| invalid(err.to_string()))?,
                    encode_enum(&conversation.last_message_from)
                        .map_err(|err| invalid(err.to_string()))?,
                    to_rfc3339(&conversation.created_at),
                    to_rfc3339(&conversation.updated_at),
                ),
            )
            .map_err(store_err)?;
        Ok(conversation)
    }

    fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, ConversationError> {
        let sql = format!("SELECT {COLUMNS} FROM conversations WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([id.as_str()]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_conversation_row(row).map(Some)
    }

    fn get_by_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<Conversation>, ConversationError> {
        // A request reassigned after an accepted dialog can have several
        // conversations; the latest one is the live one.
        let sql = format!(
            "SELECT {COLUMNS} FROM conversations WHERE request_id = ?1 ORDER BY created_at DESC LIMIT 1"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([request_id.as_str()]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_conversation_row(row).map(Some)
    }

    fn record_message(
        &self,
        id: &ConversationId,
        from: Party,
        at: DateTime<Utc>,
    ) -> Result<Conversation, ConversationError> {
        let affected = self
            .conn
            .execute(
                "UPDATE conversations SET last_message_from = ?1, updated_at = ?2 WHERE id = ?3",
                (
                    encode_enum(&from).map_err(|err| invalid(err.to_string()))?,
                    to_rfc3339(&at),
                    id.as_str(),
                ),
            )
            .map_err(store_err)?;
        if affected == 0 {
            return Err(ConversationError::NotFound);
        }
        self.get(id)?.ok_or(ConversationError::NotFound)
    }

    fn close(
        &self,
        id: &ConversationId,
        outcome: ConversationStatus,
    ) -> Result<Conversation, ConversationError> {
        let conversation = self.get(id)?.ok_or(ConversationError::NotFound)?;
        if conversation.status != ConversationStatus::InProgress {
            return Ok(conversation);
        }
        self.conn
            .execute(
                "UPDATE conversations SET status = ?1, updated_at = ?2 WHERE id = ?3",
                (
                    encode_enum(&outcome).map_err(|err| invalid(err.to_string()))?,
                    to_rfc3339(&Utc::now()),
                    id.as_str(),
                ),
            )
            .map_err(store_err)?;
        self.get(id)?.ok_or(ConversationError::NotFound)
    }

    fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Conversation>, ConversationError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM conversations WHERE status = 'InProgress' AND created_at < ?1 ORDER BY created_at ASC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([to_rfc3339(&cutoff)]).map_err(store_err)?;
        let mut conversations = Vec::new();
        while let Some(row) = rows.next().map_err(store_err)? {
            conversations.push(map_conversation_row(row)?);
        }
        Ok(conversations)
    }
}

fn map_conversation_row(row: &rusqlite::Row<'_>) -> Result<Conversation, ConversationError> {
    let id: String = row.get(0).map_err(store_err)?;
    let request_id: String = row.get(1).map_err(store_err)?;
    let user_id: i64 = row.get(2).map_err(store_err)?;
    let assistant_id: i64 = row.get(3).map_err(store_err)?;
    let status: String = row.get(4).map_err(store_err)?;
    let last_message_from: String = row.get(5).map_err(store_err)?;
    let created_at: String = row.get(6).map_err(store_err)?;
    let updated_at: String = row.get(7).map_err(store_err)?;

    Ok(Conversation {
        id: id
            .parse::<ConversationId>()
            .map_err(|err| invalid(err.to_string()))?,
        request_id: request_id
            .parse::<RequestId>()
            .map_err(|err| invalid(err.to_string()))?,
        user_id: UserId::new(user_id),
        assistant_id: AssistantId::new(assistant_id),
        status: decode_enum(&status).map_err(|err| invalid(err.to_string()))?,
        last_message_from: decode_enum(&last_message_from)
            .map_err(|err| invalid(err.to_string()))?,
        created_at: from_rfc3339(&created_at).map_err(|err| invalid(err.to_string()))?,
        updated_at: from_rfc3339(&updated_at).map_err(|err| invalid(err.to_string()))?,
    })
}
