mod common;

use chrono::{Duration, Utc};
use common::{ctx, helpline, seed_assistant};
use hl_core::error::{ArbitrationError, HelplineError, SessionError};
use hl_core::helpline::ComposeReply;
use hl_core::conversations::ConversationRepository;
use hl_core::moderators::ModeratorRepository;
use hl_core::store::Store;
use hl_core::types::{
    ArbitrationStatus, AssistantId, Decision, MessageSource, ModeratorId,
    OpenArbitrationInput, Party, UserId,
};

const USER: i64 = 100_000_001;
const ASSISTANT: i64 = 200_000_001;
const MOD_A: i64 = 300_000_001;
const MOD_B: i64 = 300_000_002;

fn dispute() -> OpenArbitrationInput {
    OpenArbitrationInput {
        user_id: UserId::new(USER),
        user_nickname: "ada".to_string(),
        assistant_id: AssistantId::new(ASSISTANT),
        assistant_nickname: "grace".to_string(),
        reason: "no resolution after three attempts".to_string(),
    }
}

fn seed_moderator(hl: &hl_core::Helpline<hl_db::DbStore>, id: i64, minutes_ago: i64) {
    let moderators = hl.store().moderators();
    moderators
        .create(ModeratorId::new(id), &format!("mod-{id}"), "hash")
        .unwrap();
    moderators
        .touch(ModeratorId::new(id), Utc::now() - Duration::minutes(minutes_ago))
        .unwrap();
}

#[test]
fn open_is_offered_to_the_most_recent_moderator() {
    let hl = helpline();
    seed_moderator(&hl, MOD_A, 60);
    seed_moderator(&hl, MOD_B, 5);

    let arbitration = hl.arbitrations().open(&ctx(), dispute()).unwrap();
    assert_eq!(arbitration.status, ArbitrationStatus::Pending);
    assert_eq!(arbitration.moderator_id, None);

    // The claim offer goes to the moderator seen last (MOD_B); check through
    // the event payload.
    let events = hl.events().list(None, None).unwrap();
    let offered = events
        .iter()
        .filter_map(|record| record.body.get("payload"))
        .find_map(|payload| payload.get("offered_to"))
        .and_then(|value| value.as_i64());
    assert_eq!(offered, Some(MOD_B));
}

#[test]
fn a_second_dispute_for_the_same_pair_is_refused() {
    let hl = helpline();
    seed_moderator(&hl, MOD_A, 1);
    hl.arbitrations().open(&ctx(), dispute()).unwrap();

    let err = hl.arbitrations().open(&ctx(), dispute()).unwrap_err();
    assert!(matches!(
        err,
        HelplineError::Arbitration(ArbitrationError::AlreadyEscalated)
    ));
}

#[test]
fn claim_binds_the_first_moderator_only() {
    let hl = helpline();
    seed_moderator(&hl, MOD_A, 1);
    seed_moderator(&hl, MOD_B, 2);
    let arbitration = hl.arbitrations().open(&ctx(), dispute()).unwrap();

    let claimed = hl
        .arbitrations()
        .claim(&ctx(), &arbitration.id, ModeratorId::new(MOD_A))
        .unwrap();
    assert_eq!(claimed.status, ArbitrationStatus::InProgress);
    assert_eq!(claimed.moderator_id, Some(ModeratorId::new(MOD_A)));

    let err = hl
        .arbitrations()
        .claim(&ctx(), &arbitration.id, ModeratorId::new(MOD_B))
        .unwrap_err();
    assert!(matches!(
        err,
        HelplineError::Arbitration(ArbitrationError::AlreadyClaimed)
    ));
    // The loser changed nothing.
    let current = hl.arbitrations().get(&arbitration.id).unwrap().unwrap();
    assert_eq!(current.moderator_id, Some(ModeratorId::new(MOD_A)));
}

#[test]
fn in_progress_arbitration_fans_out_three_ways() {
    let hl = helpline();
    seed_moderator(&hl, MOD_A, 1);
    let arbitration = hl.arbitrations().open(&ctx(), dispute()).unwrap();
    hl.arbitrations()
        .claim(&ctx(), &arbitration.id, ModeratorId::new(MOD_A))
        .unwrap();

    let source = MessageSource::Arbitration(arbitration.id.clone());
    let targets = hl.messages().route(&ctx(), &source, Party::User).unwrap();
    let roles: Vec<Party> = targets.iter().map(|target| target.role).collect();
    assert_eq!(roles, vec![Party::Assistant, Party::Moderator]);

    let targets = hl.messages().route(&ctx(), &source, Party::Moderator).unwrap();
    let roles: Vec<Party> = targets.iter().map(|target| target.role).collect();
    assert_eq!(roles, vec![Party::User, Party::Assistant]);
}

#[test]
fn pending_arbitration_does_not_relay() {
    let hl = helpline();
    seed_moderator(&hl, MOD_A, 1);
    let arbitration = hl.arbitrations().open(&ctx(), dispute()).unwrap();

    let err = hl
        .messages()
        .route(
            &ctx(),
            &MessageSource::Arbitration(arbitration.id.clone()),
            Party::User,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        HelplineError::Arbitration(ArbitrationError::InvalidState { .. })
    ));
}

#[test]
fn only_the_bound_moderator_resolves() {
    let hl = helpline();
    seed_moderator(&hl, MOD_A, 1);
    seed_moderator(&hl, MOD_B, 2);
    let arbitration = hl.arbitrations().open(&ctx(), dispute()).unwrap();
    hl.arbitrations()
        .claim(&ctx(), &arbitration.id, ModeratorId::new(MOD_A))
        .unwrap();

    let err = hl
        .arbitrations()
        .resolve(&ctx(), &arbitration.id, ModeratorId::new(MOD_B))
        .unwrap_err();
    assert!(matches!(err, HelplineError::Arbitration(_)));

    let resolved = hl
        .arbitrations()
        .resolve(&ctx(), &arbitration.id, ModeratorId::new(MOD_A))
        .unwrap();
    assert_eq!(resolved.status, ArbitrationStatus::Resolved);
}

#[test]
fn conversation_messages_reach_a_listening_moderator() {
    let hl = helpline();
    seed_assistant(&hl, ASSISTANT, Utc::now());
    seed_moderator(&hl, MOD_A, 1);

    let request = hl.requests().open(&ctx(), UserId::new(USER)).unwrap();
    hl.requests()
        .decide(
            &ctx(),
            &request.id,
            AssistantId::new(ASSISTANT),
            Decision::Accept,
        )
        .unwrap();
    let conversation = hl
        .store()
        .conversations()
        .get_by_request(&request.id)
        .unwrap()
        .unwrap();

    let source = MessageSource::Conversation(conversation.id.clone());
    let targets = hl.messages().route(&ctx(), &source, Party::User).unwrap();
    assert_eq!(targets.len(), 1);

    let arbitration = hl.arbitrations().open(&ctx(), dispute()).unwrap();
    hl.arbitrations()
        .claim(&ctx(), &arbitration.id, ModeratorId::new(MOD_A))
        .unwrap();

    let targets = hl.messages().route(&ctx(), &source, Party::User).unwrap();
    let roles: Vec<Party> = targets.iter().map(|target| target.role).collect();
    assert_eq!(roles, vec![Party::Assistant, Party::Moderator]);
}

#[test]
fn compose_flow_walks_target_then_message() {
    let hl = helpline();
    seed_moderator(&hl, MOD_A, 1);

    hl.moderators()
        .begin_compose(&ctx(), ModeratorId::new(MOD_A), Party::User)
        .unwrap();

    // A malformed chat id is rejected and the state stays put.
    let err = hl
        .moderators()
        .compose_input(&ctx(), ModeratorId::new(MOD_A), "42")
        .unwrap_err();
    assert!(matches!(
        err,
        HelplineError::Session(SessionError::InvalidInput { .. })
    ));

    let reply = hl
        .moderators()
        .compose_input(&ctx(), ModeratorId::new(MOD_A), "100000001")
        .unwrap();
    assert_eq!(reply, ComposeReply::PromptMessage);

    let reply = hl
        .moderators()
        .compose_input(&ctx(), ModeratorId::new(MOD_A), "please check your order")
        .unwrap();
    let ComposeReply::Relay { target, text } = reply else {
        panic!("expected a relay");
    };
    assert_eq!(target.role, Party::User);
    assert_eq!(target.id, 100_000_001);
    assert!(text.contains("please check your order"));

    // Flow is finished; further input has no session.
    let err = hl
        .moderators()
        .compose_input(&ctx(), ModeratorId::new(MOD_A), "again")
        .unwrap_err();
    assert!(matches!(
        err,
        HelplineError::Session(SessionError::NotFound)
    ));
}
