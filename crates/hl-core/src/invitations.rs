use crate::error::InvitationError;
use crate::types::{Invitation, InviteRole};
use sha2::{Digest, Sha256};

/// Moderator credentials are stored hashed; plaintext never reaches the
/// record store.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub trait InvitationRepository {
    fn create(
        &self,
        token: &str,
        role: InviteRole,
        login: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Invitation, InvitationError>;
    fn get_by_token(&self, token: &str) -> Result<Option<Invitation>, InvitationError>;
    fn mark_used(&self, token: &str) -> Result<Invitation, InvitationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_stable_and_hex() {
        let hash = hash_password("defaultPassword");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_password("defaultPassword"));
        assert_ne!(hash, hash_password("otherPassword"));
    }
}
