use crate::types::Assistant;
use std::cmp::Ordering;

/// A selection candidate with its penalty score attached.
#[derive(Debug, Clone)]
pub struct RankedAssistant {
    pub assistant: Assistant,
    pub penalty: i64,
}

/// Fewer recent infractions wins; ties go to the assistant seen most
/// recently, then to the lower id so the order is deterministic.
pub fn compare(a: &RankedAssistant, b: &RankedAssistant) -> Ordering {
    a.penalty
        .cmp(&b.penalty)
        .then_with(|| b.assistant.last_active_at.cmp(&a.assistant.last_active_at))
        .then_with(|| a.assistant.id.cmp(&b.assistant.id))
}

/// Pick the best candidate, or `None` when the pool is empty. Pure selection;
/// the caller marks the winner busy.
pub fn select(mut candidates: Vec<RankedAssistant>) -> Option<Assistant> {
    candidates.sort_by(compare);
    candidates.into_iter().next().map(|ranked| ranked.assistant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssistantId;
    use chrono::{Duration, Utc};

    fn assistant(id: i64, minutes_ago: Option<i64>) -> Assistant {
        Assistant {
            id: AssistantId::new(id),
            is_working: true,
            is_busy: false,
            coins: 0,
            last_active_at: minutes_ago.map(|m| Utc::now() - Duration::minutes(m)),
            created_at: Utc::now(),
        }
    }

    fn ranked(id: i64, penalty: i64, minutes_ago: Option<i64>) -> RankedAssistant {
        RankedAssistant {
            assistant: assistant(id, minutes_ago),
            penalty,
        }
    }

    #[test]
    fn lower_penalty_wins() {
        let chosen = select(vec![ranked(1, 2, Some(1)), ranked(2, 0, Some(60))]).unwrap();
        assert_eq!(chosen.id, AssistantId::new(2));
    }

    #[test]
    fn penalty_tie_breaks_on_recency() {
        let chosen = select(vec![ranked(1, 1, Some(120)), ranked(2, 1, Some(5))]).unwrap();
        assert_eq!(chosen.id, AssistantId::new(2));
    }

    #[test]
    fn never_seen_ranks_below_recently_seen() {
        let chosen = select(vec![ranked(1, 0, None), ranked(2, 0, Some(30))]).unwrap();
        assert_eq!(chosen.id, AssistantId::new(2));
    }

    #[test]
    fn empty_pool_selects_nobody() {
        assert!(select(Vec::new()).is_none());
    }
}
