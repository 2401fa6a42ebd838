use crate::error::NotifyError;
use crate::types::{EventBody, Party};

/// Outbound delivery address: which front-end channel (by role) and which
/// chat id on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorRef {
    pub role: Party,
    pub id: i64,
}

impl ActorRef {
    pub fn user(id: i64) -> Self {
        Self {
            role: Party::User,
            id,
        }
    }

    pub fn assistant(id: i64) -> Self {
        Self {
            role: Party::Assistant,
            id,
        }
    }

    pub fn moderator(id: i64) -> Self {
        Self {
            role: Party::Moderator,
            id,
        }
    }
}

/// An inline action button offered with a notification; `data` is the opaque
/// callback payload the transport echoes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyAction {
    pub label: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub target: ActorRef,
    pub text: String,
    pub actions: Vec<NotifyAction>,
}

impl Notification {
    fn plain(target: ActorRef, text: impl Into<String>) -> Self {
        Self {
            target,
            text: text.into(),
            actions: Vec::new(),
        }
    }
}

/// The one capability the core needs from the messaging transport. Each role
/// maps to its own channel behind this seam.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        target: &ActorRef,
        text: &str,
        actions: &[NotifyAction],
    ) -> Result<(), NotifyError>;
}

/// Deliver with a single retry. State committed before we got here, so a
/// failed send is logged and dropped, never propagated.
pub fn dispatch(notifier: &dyn Notifier, notification: &Notification) {
    for attempt in 0..2 {
        match notifier.send(
            &notification.target,
            &notification.text,
            &notification.actions,
        ) {
            Ok(()) => return,
            Err(err) if attempt == 0 => {
                tracing::warn!(target_id = notification.target.id, error = %err, "notification send failed, retrying");
            }
            Err(err) => {
                tracing::error!(target_id = notification.target.id, error = %err, "notification dropped after retry");
            }
        }
    }
}

/// Map a committed event to the messages each participant should see.
pub fn notifications_for(body: &EventBody) -> Vec<Notification> {
    match body {
        EventBody::AssistantOffered {
            request,
            assistant_id,
        } => vec![Notification {
            target: ActorRef::assistant(assistant_id.get()),
            text: "A new support request is waiting for you.".to_string(),
            actions: vec![
                NotifyAction {
                    label: "Accept".to_string(),
                    data: format!("accept_{}", request.id),
                },
                NotifyAction {
                    label: "Decline".to_string(),
                    data: format!("reject_{}", request.id),
                },
            ],
        }],
        EventBody::RequestAccepted {
            request,
            conversation,
        } => vec![
            Notification::plain(
                ActorRef::assistant(conversation.assistant_id.get()),
                "You accepted the request. Wait for the user to state their question.",
            ),
            Notification::plain(
                ActorRef::user(request.user_id.get()),
                "An assistant joined the chat. Please state your question.",
            ),
        ],
        EventBody::RequestRejected { assistant_id, .. } => vec![Notification::plain(
            ActorRef::assistant(assistant_id.get()),
            "You declined the request.",
        )],
        EventBody::RequestCompleted { request } => vec![Notification::plain(
            ActorRef::user(request.user_id.get()),
            "The dialog has been closed.",
        )],
        EventBody::RequestAborted { request } => match request.assistant_id {
            Some(assistant_id) => vec![Notification::plain(
                ActorRef::assistant(assistant_id.get()),
                "The user left the dialog.",
            )],
            None => Vec::new(),
        },
        EventBody::CoinsAwarded { transaction } => vec![Notification::plain(
            ActorRef::assistant(transaction.assistant_id.get()),
            format!(
                "You earned {} coin(s) for completing a dialog.",
                transaction.amount
            ),
        )],
        EventBody::ArbitrationOpened {
            arbitration,
            offered_to,
        } => {
            let mut notifications = vec![Notification::plain(
                ActorRef::user(arbitration.user_id.get()),
                "Your dispute has been submitted to a moderator.",
            )];
            if let Some(moderator_id) = offered_to {
                notifications.push(Notification {
                    target: ActorRef::moderator(moderator_id.get()),
                    text: format!(
                        "New arbitration between {} and {}: {}",
                        arbitration.user_nickname, arbitration.assistant_nickname,
                        arbitration.reason
                    ),
                    actions: vec![NotifyAction {
                        label: "Review".to_string(),
                        data: format!("review_{}", arbitration.id),
                    }],
                });
            }
            notifications
        }
        EventBody::ArbitrationClaimed { arbitration } => {
            let mut notifications = vec![Notification::plain(
                ActorRef::user(arbitration.user_id.get()),
                "A moderator joined the discussion. Describe your problem.",
            )];
            notifications.push(Notification::plain(
                ActorRef::assistant(arbitration.assistant_id.get()),
                "A moderator joined the discussion. Describe your problem.",
            ));
            if let Some(moderator_id) = arbitration.moderator_id {
                notifications.push(Notification::plain(
                    ActorRef::moderator(moderator_id.get()),
                    "You joined the discussion. Wait for the participants to describe the problem.",
                ));
            }
            notifications
        }
        EventBody::ArbitrationResolved { arbitration } => vec![
            Notification::plain(
                ActorRef::user(arbitration.user_id.get()),
                "The moderator closed the dispute.",
            ),
            Notification::plain(
                ActorRef::assistant(arbitration.assistant_id.get()),
                "The moderator closed the dispute.",
            ),
        ],
        EventBody::AssistantJoined { assistant } => vec![Notification::plain(
            ActorRef::assistant(assistant.id.get()),
            "Congratulations, you are now an assistant with access to the bot.",
        )],
        EventBody::ModeratorJoined { moderator } => vec![Notification::plain(
            ActorRef::moderator(moderator.id.get()),
            "Welcome, you now have moderator privileges.",
        )],
        EventBody::RequestOpened { .. }
        | EventBody::RequestQueued { .. }
        | EventBody::RequestIgnored { .. }
        | EventBody::ConversationClosed { .. }
        | EventBody::WorkShiftChanged { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RequestId, RequestStatus, SupportRequest, UserId};
    use chrono::Utc;
    use std::sync::Mutex;

    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
        pub fail_times: Mutex<u32>,
    }

    impl RecordingNotifier {
        pub(crate) fn new(fail_times: u32) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_times: Mutex::new(fail_times),
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(
            &self,
            target: &ActorRef,
            text: &str,
            actions: &[NotifyAction],
        ) -> Result<(), NotifyError> {
            let mut remaining = self.fail_times.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(NotifyError::SendFailed {
                    message: "unreachable".to_string(),
                });
            }
            self.sent.lock().unwrap().push(Notification {
                target: *target,
                text: text.to_string(),
                actions: actions.to_vec(),
            });
            Ok(())
        }
    }

    fn offered_event() -> EventBody {
        let request = SupportRequest {
            id: RequestId::generate(),
            user_id: UserId::new(100_000_001),
            assistant_id: Some(crate::types::AssistantId::new(200_000_001)),
            status: RequestStatus::Pending,
            is_active: true,
            ignored_assistants: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        EventBody::AssistantOffered {
            assistant_id: request.assistant_id.unwrap(),
            request,
        }
    }

    #[test]
    fn offer_carries_accept_and_decline_actions() {
        let notifications = notifications_for(&offered_event());
        assert_eq!(notifications.len(), 1);
        let offer = &notifications[0];
        assert_eq!(offer.target.role, Party::Assistant);
        assert_eq!(offer.actions.len(), 2);
        assert!(offer.actions[0].data.starts_with("accept_req_"));
        assert!(offer.actions[1].data.starts_with("reject_req_"));
    }

    #[test]
    fn dispatch_retries_once_then_succeeds() {
        let notifier = RecordingNotifier::new(1);
        let notification = notifications_for(&offered_event()).remove(0);
        dispatch(&notifier, &notification);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn dispatch_drops_after_second_failure() {
        let notifier = RecordingNotifier::new(2);
        let notification = notifications_for(&offered_event()).remove(0);
        dispatch(&notifier, &notification);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}
