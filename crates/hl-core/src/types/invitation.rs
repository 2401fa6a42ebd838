use crate::types::enums::InviteRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A one-shot onboarding token. Generation and link delivery belong to the
/// admin collaborator; the core only stores and redeems them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub token: String,
    pub role: InviteRole,
    pub login: Option<String>,
    pub password_hash: Option<String>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}
