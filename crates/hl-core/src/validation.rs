use crate::error::{RequestError, SessionError};
use crate::types::{AssistantId, RequestStatus, SupportRequest};

/// A decision is only valid while the request is Pending and only from the
/// assistant it is currently offered to; a stale accept from a previously
/// offered assistant must not mutate anything.
pub fn validate_decision(
    request: &SupportRequest,
    assistant_id: AssistantId,
) -> Result<(), RequestError> {
    if request.status != RequestStatus::Pending {
        return Err(RequestError::InvalidState {
            from: request.status,
        });
    }
    if request.assistant_id != Some(assistant_id) {
        return Err(RequestError::InvalidState {
            from: request.status,
        });
    }
    Ok(())
}

pub fn validate_request_transition(
    from: RequestStatus,
    to: RequestStatus,
) -> Result<(), RequestError> {
    use RequestStatus::{Aborted, Completed, InProgress, Pending, Rejected};

    let valid = match (from, to) {
        (Pending, InProgress) => true,
        (Pending | InProgress, Pending) => true,
        (Pending, Rejected) => true,
        (InProgress, Completed) => true,
        (Pending | InProgress, Aborted) => true,
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(RequestError::InvalidState { from })
    }
}

/// Messenger chat ids are 9 or 10 decimal digits.
pub fn validate_target_id(text: &str) -> Result<i64, SessionError> {
    let trimmed = text.trim();
    if !(9..=10).contains(&trimmed.len()) || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(SessionError::InvalidInput {
            message: "target id must be 9-10 digits".to_string(),
        });
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| SessionError::InvalidInput {
            message: "target id must be 9-10 digits".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(status: RequestStatus, assistant: Option<i64>) -> SupportRequest {
        SupportRequest {
            id: crate::types::RequestId::generate(),
            user_id: crate::types::UserId::new(100_000_001),
            assistant_id: assistant.map(AssistantId::new),
            status,
            is_active: status.is_active(),
            ignored_assistants: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn decision_requires_pending() {
        let req = request(RequestStatus::InProgress, Some(1));
        assert!(matches!(
            validate_decision(&req, AssistantId::new(1)),
            Err(RequestError::InvalidState { .. })
        ));
    }

    #[test]
    fn decision_requires_the_offered_assistant() {
        let req = request(RequestStatus::Pending, Some(1));
        assert!(validate_decision(&req, AssistantId::new(1)).is_ok());
        assert!(validate_decision(&req, AssistantId::new(2)).is_err());
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        for from in [
            RequestStatus::Rejected,
            RequestStatus::Completed,
            RequestStatus::Aborted,
        ] {
            assert!(validate_request_transition(from, RequestStatus::Pending).is_err());
        }
    }

    #[test]
    fn reassignment_keeps_pending_reachable() {
        assert!(validate_request_transition(RequestStatus::InProgress, RequestStatus::Pending)
            .is_ok());
    }

    #[test]
    fn target_id_length_is_enforced() {
        assert!(validate_target_id("123456789").is_ok());
        assert!(validate_target_id("1234567890").is_ok());
        assert!(validate_target_id("12345678").is_err());
        assert!(validate_target_id("12345678901").is_err());
        assert!(validate_target_id("12345678a").is_err());
    }
}
