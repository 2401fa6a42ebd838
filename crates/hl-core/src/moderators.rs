use crate::error::ModeratorError;
use crate::types::{Moderator, ModeratorId};
use chrono::{DateTime, Utc};

pub trait ModeratorRepository {
    fn create(
        &self,
        id: ModeratorId,
        login: &str,
        password_hash: &str,
    ) -> Result<Moderator, ModeratorError>;
    fn get(&self, id: ModeratorId) -> Result<Option<Moderator>, ModeratorError>;
    /// New arbitrations are offered to the moderator seen most recently.
    fn most_recently_active(&self) -> Result<Option<Moderator>, ModeratorError>;
    fn touch(&self, id: ModeratorId, at: DateTime<Utc>) -> Result<Moderator, ModeratorError>;
}
