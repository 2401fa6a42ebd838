use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use chrono::Utc;
use hl_core::error::InvitationError;
use hl_core::invitations::InvitationRepository;
use hl_core::types::{Invitation, InviteRole};
use rusqlite::Connection;

const COLUMNS: &str = "token, role, login, password_hash, used, created_at";

pub struct InvitationRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> InvitationRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn store_err(err: rusqlite::Error) -> InvitationError {
    InvitationError::Store {
        message: err.to_string(),
    }
}

impl<'a> InvitationRepository for InvitationRepo<'a> {
    fn create(
        &self,
        token: &str,
        role: InviteRole,
        login: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Invitation, InvitationError> {
        let invitation = Invitation {
            token: token.to_string(),
            role,
            login: login.map(str::to_string),
            password_hash: password_hash.map(str::to_string),
            used: false,
            created_at: Utc::now(),
        };
        let sql = "INSERT INTO invitations (token, role, login, password_hash, used, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        self.conn
            .execute(
                sql,
                (
                    invitation.token.clone(),
                    encode_enum(&invitation.role).map_err(|err| {
                        InvitationError::InvalidInput {
                            message: err.to_string(),
                        }
                    })?,
                    invitation.login.clone(),
                    invitation.password_hash.clone(),
                    invitation.used,
                    to_rfc3339(&invitation.created_at),
                ),
            )
            .map_err(store_err)?;
        Ok(invitation)
    }

    fn get_by_token(&self, token: &str) -> Result<Option<Invitation>, InvitationError> {
        let sql = format!("SELECT {COLUMNS} FROM invitations WHERE token = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let mut rows = stmt.query([token]).map_err(store_err)?;
        let Some(row) = rows.next().map_err(store_err)? else {
            return Ok(None);
        };
        map_invitation_row(row).map(Some)
    }

    fn mark_used(&self, token: &str) -> Result<Invitation, InvitationError> {
        let affected = self
            .conn
            .execute("UPDATE invitations SET used = 1 WHERE token = ?1", [token])
            .map_err(store_err)?;
        if affected == 0 {
            return Err(InvitationError::InvalidToken);
        }
        self.get_by_token(token)?
            .ok_or(InvitationError::InvalidToken)
    }
}

fn map_invitation_row(row: &rusqlite::Row<'_>) -> Result<Invitation, InvitationError> {
    let invalid = |message: String| InvitationError::Store { message };

    let token: String = row.get(0).map_err(store_err)?;
    let role: String = row.get(1).map_err(store_err)?;
    let login: Option<String> = row.get(2).map_err(store_err)?;
    let password_hash: Option<String> = row.get(3).map_err(store_err)?;
    let used: bool = row.get(4).map_err(store_err)?;
    let created_at: String = row.get(5).map_err(store_err)?;

    Ok(Invitation {
        token,
        role: decode_enum(&role).map_err(|err| invalid(err.to_string()))?,
        login,
        password_hash,
        used,
        created_at: from_rfc3339(&created_at).map_err(|err| invalid(err.to_string()))?,
    })
}
