use crate::types::arbitration::{Arbitration, Moderator};
use crate::types::assistant::{Assistant, CoinTransaction};
use crate::types::conversation::Conversation;
use crate::types::ids::{AssistantId, ModeratorId, RequestId};
use crate::types::request::SupportRequest;
use serde::{Deserialize, Serialize};

/// Everything that happened as part of a committed mutation. Appended to the
/// event table inside the same transaction, published on the bus after
/// commit, and mapped to outbound notifications by `notify::notifications_for`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventBody {
    RequestOpened {
        request: SupportRequest,
    },
    AssistantOffered {
        request: SupportRequest,
        assistant_id: AssistantId,
    },
    RequestQueued {
        request_id: RequestId,
    },
    RequestAccepted {
        request: SupportRequest,
        conversation: Conversation,
    },
    RequestRejected {
        request_id: RequestId,
        assistant_id: AssistantId,
    },
    RequestIgnored {
        request_id: RequestId,
        assistant_id: AssistantId,
    },
    RequestCompleted {
        request: SupportRequest,
    },
    RequestAborted {
        request: SupportRequest,
    },
    ConversationClosed {
        conversation: Conversation,
    },
    CoinsAwarded {
        transaction: CoinTransaction,
    },

    ArbitrationOpened {
        arbitration: Arbitration,
        offered_to: Option<ModeratorId>,
    },
    ArbitrationClaimed {
        arbitration: Arbitration,
    },
    ArbitrationResolved {
        arbitration: Arbitration,
    },

    AssistantJoined {
        assistant: Assistant,
    },
    ModeratorJoined {
        moderator: Moderator,
    },
    WorkShiftChanged {
        assistant: Assistant,
    },
}
