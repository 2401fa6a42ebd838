mod common;

use chrono::{Duration, Utc};
use common::{backdate, ctx, helpline, seed_assistant};
use hl_core::actions::ActionRepository;
use hl_core::coins::CoinLedgerRepository;
use hl_core::conversations::ConversationRepository;
use hl_core::penalty;
use hl_core::store::Store;
use hl_core::types::{
    ActionKind, AssistantId, ConversationStatus, Decision, MessageSource, Party, RequestStatus,
    UserId,
};
use hl_events::types::EventSource;

const USER: i64 = 100_000_001;
const ASSISTANT_A: i64 = 200_000_001;
const ASSISTANT_B: i64 = 200_000_002;

fn sweep_ctx() -> hl_core::RequestContext {
    hl_core::RequestContext::new(EventSource::Sweeper, None)
}

#[test]
fn idle_dialog_with_assistant_last_completes_and_pays_once() {
    let hl = helpline();
    seed_assistant(&hl, ASSISTANT_A, Utc::now());
    let request = hl.requests().open(&ctx(), UserId::new(USER)).unwrap();
    hl.requests()
        .decide(
            &ctx(),
            &request.id,
            AssistantId::new(ASSISTANT_A),
            Decision::Accept,
        )
        .unwrap();
    let conversation = hl
        .store()
        .conversations()
        .get_by_request(&request.id)
        .unwrap()
        .unwrap();
    // 61 minutes old, last word from the assistant.
    backdate(
        &hl,
        "conversations",
        "created_at",
        "id",
        conversation.id.as_str(),
        Utc::now() - Duration::minutes(61),
    );

    let report = hl.sweep().run(&sweep_ctx()).unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.reassigned, 0);
    assert_eq!(report.resolved(), 1);

    let request = hl.requests().get(&request.id).unwrap().unwrap();
    assert_eq!(request.status, RequestStatus::Completed);
    let assistant = hl.assistants().get(AssistantId::new(ASSISTANT_A)).unwrap().unwrap();
    assert!(!assistant.is_busy);
    assert_eq!(assistant.coins, 1);

    // A second pass is a no-op: one ledger row, not two.
    let report = hl.sweep().run(&sweep_ctx()).unwrap();
    assert_eq!(report.resolved(), 0);
    let transactions = hl
        .store()
        .coins()
        .list_for_assistant(AssistantId::new(ASSISTANT_A))
        .unwrap();
    assert_eq!(transactions.len(), 1);
}

#[test]
fn idle_dialog_with_user_last_reassigns() {
    let hl = helpline();
    let now = Utc::now();
    seed_assistant(&hl, ASSISTANT_A, now);
    seed_assistant(&hl, ASSISTANT_B, now - Duration::minutes(5));
    let request = hl.requests().open(&ctx(), UserId::new(USER)).unwrap();
    let first = request.assistant_id.unwrap();
    hl.requests()
        .decide(&ctx(), &request.id, first, Decision::Accept)
        .unwrap();
    let conversation = hl
        .store()
        .conversations()
        .get_by_request(&request.id)
        .unwrap()
        .unwrap();
    // The user asked and never got an answer.
    hl.messages()
        .route(
            &ctx(),
            &MessageSource::Conversation(conversation.id.clone()),
            Party::User,
        )
        .unwrap();
    backdate(
        &hl,
        "conversations",
        "created_at",
        "id",
        conversation.id.as_str(),
        now - Duration::minutes(61),
    );

    let report = hl.sweep().run(&sweep_ctx()).unwrap();
    assert_eq!(report.reassigned, 1);
    assert_eq!(report.completed, 0);

    let request = hl.requests().get(&request.id).unwrap().unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.is_active);
    let second = request.assistant_id.unwrap();
    assert_ne!(second, first);
    assert!(request.ignored_assistants.contains(&first));

    // The silent assistant was freed, penalized, and unpaid.
    let offender = hl.assistants().get(first).unwrap().unwrap();
    assert!(!offender.is_busy);
    assert_eq!(offender.coins, 0);
    let actions = hl
        .store()
        .actions()
        .list_for_assistant_since(first, now - Duration::hours(1))
        .unwrap();
    assert_eq!(penalty::score(&actions), penalty::REJECTED_WEIGHT);
    let conversation = hl.store().conversations().get(&conversation.id).unwrap().unwrap();
    assert_eq!(conversation.status, ConversationStatus::Aborted);
}

#[test]
fn unanswered_offer_counts_as_ignored() {
    let hl = helpline();
    let now = Utc::now();
    seed_assistant(&hl, ASSISTANT_A, now);
    seed_assistant(&hl, ASSISTANT_B, now - Duration::minutes(5));
    let request = hl.requests().open(&ctx(), UserId::new(USER)).unwrap();
    let first = request.assistant_id.unwrap();
    // The offer sat unanswered past the offer timeout.
    backdate(
        &hl,
        "requests",
        "updated_at",
        "id",
        request.id.as_str(),
        now - Duration::minutes(11),
    );

    let report = hl.sweep().run(&sweep_ctx()).unwrap();
    assert_eq!(report.offers_expired, 1);

    let request = hl.requests().get(&request.id).unwrap().unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_ne!(request.assistant_id, Some(first));

    let actions = hl
        .store()
        .actions()
        .list_for_assistant_since(first, now - Duration::hours(1))
        .unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, ActionKind::Ignored);
    assert_eq!(penalty::score(&actions), penalty::IGNORED_WEIGHT);
}

#[test]
fn queued_requests_are_revisited_when_the_pool_refills() {
    let hl = helpline();
    let request = hl.requests().open(&ctx(), UserId::new(USER)).unwrap();
    assert_eq!(request.assistant_id, None);

    // Nothing to do while the pool is empty.
    let report = hl.sweep().run(&sweep_ctx()).unwrap();
    assert_eq!(report.revisited, 0);

    seed_assistant(&hl, ASSISTANT_A, Utc::now());
    let report = hl.sweep().run(&sweep_ctx()).unwrap();
    assert_eq!(report.revisited, 1);

    let request = hl.requests().get(&request.id).unwrap().unwrap();
    assert_eq!(request.assistant_id, Some(AssistantId::new(ASSISTANT_A)));
    assert_eq!(request.status, RequestStatus::Pending);
}

#[test]
fn one_bad_row_does_not_stop_the_batch() {
    let hl = helpline();
    let now = Utc::now();
    seed_assistant(&hl, ASSISTANT_A, now);
    seed_assistant(&hl, ASSISTANT_B, now - Duration::minutes(5));

    // Two stale dialogs for two users; corrupt the first one's status enum so
    // its per-item transaction fails.
    for (user, minutes) in [(USER, 61), (USER + 1, 62)] {
        let request = hl.requests().open(&ctx(), UserId::new(user)).unwrap();
        let offered = request.assistant_id.unwrap();
        hl.requests()
            .decide(&ctx(), &request.id, offered, Decision::Accept)
            .unwrap();
        let conversation = hl
            .store()
            .conversations()
            .get_by_request(&request.id)
            .unwrap()
            .unwrap();
        backdate(
            &hl,
            "conversations",
            "created_at",
            "id",
            conversation.id.as_str(),
            now - Duration::minutes(minutes),
        );
    }
    let corrupt = hl
        .store()
        .conversations()
        .list_stale(now - Duration::minutes(60))
        .unwrap()[0]
        .clone();
    hl.store()
        .connection()
        .execute(
            "UPDATE requests SET status = 'Bogus' WHERE id = ?1",
            [corrupt.request_id.as_str()],
        )
        .unwrap();

    let report = hl.sweep().run(&sweep_ctx()).unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.completed, 1);
}

#[test]
fn expired_sessions_are_cleaned_by_the_sweep() {
    let hl = helpline();
    use hl_core::moderators::ModeratorRepository;
    use hl_core::sessions::ActorSessionRepository;
    use hl_core::types::{ModeratorId, SessionState};

    hl.store()
        .moderators()
        .create(ModeratorId::new(300_000_001), "mod-1", "hash")
        .unwrap();
    hl.store()
        .sessions()
        .put(
            300_000_001,
            Party::Moderator,
            SessionState::AwaitingTargetId {
                target_role: Party::User,
            },
            Utc::now() - Duration::minutes(1),
        )
        .unwrap();

    let report = hl.sweep().run(&sweep_ctx()).unwrap();
    assert_eq!(report.sessions_expired, 1);
}
