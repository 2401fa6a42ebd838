use crate::types::{ActionKind, RequestAction};

/// An explicit decline costs one point.
pub const REJECTED_WEIGHT: i64 = 1;
/// Silently ignoring an offer costs three, so non-response is strictly worse
/// than declining.
pub const IGNORED_WEIGHT: i64 = 3;

pub fn action_weight(kind: ActionKind) -> i64 {
    match kind {
        ActionKind::Rejected => REJECTED_WEIGHT,
        ActionKind::Ignored => IGNORED_WEIGHT,
    }
}

/// Score over the actions already filtered to the trailing penalty window.
pub fn score(actions: &[RequestAction]) -> i64 {
    actions
        .iter()
        .map(|action| action_weight(action.action))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionId, AssistantId, RequestId};
    use chrono::Utc;

    fn action(kind: ActionKind) -> RequestAction {
        RequestAction {
            id: ActionId::generate(),
            request_id: RequestId::generate(),
            assistant_id: AssistantId::new(100_000_001),
            action: kind,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_window_scores_zero() {
        assert_eq!(score(&[]), 0);
    }

    #[test]
    fn ignores_cost_three_times_a_rejection() {
        let actions = vec![
            action(ActionKind::Rejected),
            action(ActionKind::Ignored),
            action(ActionKind::Rejected),
        ];
        assert_eq!(score(&actions), 5);
    }
}
