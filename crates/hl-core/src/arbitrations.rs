use crate::error::ArbitrationError;
use crate::types::{
    Arbitration, ArbitrationId, AssistantId, ModeratorId, OpenArbitrationInput, UserId,
};

pub trait ArbitrationRepository {
    fn create(&self, input: OpenArbitrationInput) -> Result<Arbitration, ArbitrationError>;
    fn get(&self, id: &ArbitrationId) -> Result<Option<Arbitration>, ArbitrationError>;
    fn get_active_for_pair(
        &self,
        user_id: UserId,
        assistant_id: AssistantId,
    ) -> Result<Option<Arbitration>, ArbitrationError>;
    /// Compare-and-set Pending -> InProgress binding the moderator. The race
    /// loser gets `AlreadyClaimed`.
    fn claim(
        &self,
        id: &ArbitrationId,
        moderator_id: ModeratorId,
    ) -> Result<Arbitration, ArbitrationError>;
    fn resolve(&self, id: &ArbitrationId) -> Result<Arbitration, ArbitrationError>;
}
