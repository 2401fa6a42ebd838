use hl_core::error::HelplineError;
use hl_core::store::Store;
use rusqlite::Connection;

use crate::action_repo::ActionRepo;
use crate::arbitration_repo::ArbitrationRepo;
use crate::assistant_repo::AssistantRepo;
use crate::coin_repo::CoinRepo;
use crate::conversation_repo::ConversationRepo;
use crate::event_repo::EventRepo;
use crate::invitation_repo::InvitationRepo;
use crate::moderator_repo::ModeratorRepo;
use crate::request_repo::RequestRepo;
use crate::session_repo::SessionRepo;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for DbStore {
    type Requests<'a>
        = RequestRepo<'a>
    where
        Self: 'a;
    type Assistants<'a>
        = AssistantRepo<'a>
    where
        Self: 'a;
    type Conversations<'a>
        = ConversationRepo<'a>
    where
        Self: 'a;
    type Arbitrations<'a>
        = ArbitrationRepo<'a>
    where
        Self: 'a;
    type Actions<'a>
        = ActionRepo<'a>
    where
        Self: 'a;
    type Coins<'a>
        = CoinRepo<'a>
    where
        Self: 'a;
    type Moderators<'a>
        = ModeratorRepo<'a>
    where
        Self: 'a;
    type Sessions<'a>
        = SessionRepo<'a>
    where
        Self: 'a;
    type Invitations<'a>
        = InvitationRepo<'a>
    where
        Self: 'a;
    type Events<'a>
        = EventRepo<'a>
    where
        Self: 'a;

    fn requests(&self) -> Self::Requests<'_> {
        RequestRepo::new(&self.conn)
    }

    fn assistants(&self) -> Self::Assistants<'_> {
        AssistantRepo::new(&self.conn)
    }

    fn conversations(&self) -> Self::Conversations<'_> {
        ConversationRepo::new(&self.conn)
    }

    fn arbitrations(&self) -> Self::Arbitrations<'_> {
        ArbitrationRepo::new(&self.conn)
    }

    fn actions(&self) -> Self::Actions<'_> {
        ActionRepo::new(&self.conn)
    }

    fn coins(&self) -> Self::Coins<'_> {
        CoinRepo::new(&self.conn)
    }

    fn moderators(&self) -> Self::Moderators<'_> {
        ModeratorRepo::new(&self.conn)
    }

    fn sessions(&self) -> Self::Sessions<'_> {
        SessionRepo::new(&self.conn)
    }

    fn invitations(&self) -> Self::Invitations<'_> {
        InvitationRepo::new(&self.conn)
    }

    fn events(&self) -> Self::Events<'_> {
        EventRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, HelplineError>
    where
        F: FnOnce(&Self) -> Result<T, HelplineError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|err| HelplineError::Internal {
                message: err.to_string(),
            })?;
        let result = f(self);
        match result {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|err| HelplineError::Internal {
                        message: err.to_string(),
                    })?;
                Ok(value)
            }
            Err(err) => {
                self.conn
                    .execute_batch("ROLLBACK")
                    .map_err(|rollback_err| HelplineError::Internal {
                        message: rollback_err.to_string(),
                    })?;
                Err(err)
            }
        }
    }
}
