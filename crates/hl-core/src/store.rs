use crate::actions::ActionRepository;
use crate::arbitrations::ArbitrationRepository;
use crate::assistants::AssistantRepository;
use crate::coins::CoinLedgerRepository;
use crate::conversations::ConversationRepository;
use crate::events::EventRepository;
use crate::invitations::InvitationRepository;
use crate::moderators::ModeratorRepository;
use crate::requests::RequestRepository;
use crate::sessions::ActorSessionRepository;
use crate::HelplineError;

pub trait Store {
    type Requests<'a>: RequestRepository
    where
        Self: 'a;
    type Assistants<'a>: AssistantRepository
    where
        Self: 'a;
    type Conversations<'a>: ConversationRepository
    where
        Self: 'a;
    type Arbitrations<'a>: ArbitrationRepository
    where
        Self: 'a;
    type Actions<'a>: ActionRepository
    where
        Self: 'a;
    type Coins<'a>: CoinLedgerRepository
    where
        Self: 'a;
    type Moderators<'a>: ModeratorRepository
    where
        Self: 'a;
    type Sessions<'a>: ActorSessionRepository
    where
        Self: 'a;
    type Invitations<'a>: InvitationRepository
    where
        Self: 'a;
    type Events<'a>: EventRepository
    where
        Self: 'a;

    fn requests(&self) -> Self::Requests<'_>;
    fn assistants(&self) -> Self::Assistants<'_>;
    fn conversations(&self) -> Self::Conversations<'_>;
    fn arbitrations(&self) -> Self::Arbitrations<'_>;
    fn actions(&self) -> Self::Actions<'_>;
    fn coins(&self) -> Self::Coins<'_>;
    fn moderators(&self) -> Self::Moderators<'_>;
    fn sessions(&self) -> Self::Sessions<'_>;
    fn invitations(&self) -> Self::Invitations<'_>;
    fn events(&self) -> Self::Events<'_>;

    /// Run `f` as one atomic read-modify-write unit. Every mutation of a
    /// request, assistant, or arbitration record goes through here so racing
    /// writers serialize and the loser re-reads committed state.
    fn with_tx<F, T>(&self, f: F) -> Result<T, HelplineError>
    where
        F: FnOnce(&Self) -> Result<T, HelplineError>;
}
