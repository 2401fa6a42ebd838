mod common;

use chrono::{Duration, Utc};
use common::{ctx, helpline_at};
use hl_core::error::{ArbitrationError, HelplineError, RequestError};
use hl_core::moderators::ModeratorRepository;
use hl_core::store::Store;
use hl_core::types::{
    AssistantId, Decision, ModeratorId, OpenArbitrationInput, RequestStatus, UserId,
};
use hl_core::HelplineConfig;
use std::sync::Barrier;
use std::sync::Arc;
use std::thread;

const USER: i64 = 100_000_001;
const ASSISTANT: i64 = 200_000_001;
const MOD_A: i64 = 300_000_001;
const MOD_B: i64 = 300_000_002;

fn db_file() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir
        .path()
        .join("helpline.db")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

#[test]
fn concurrent_accepts_produce_one_winner() {
    let (_dir, path) = db_file();
    let hl = helpline_at(&path, HelplineConfig::default());
    common::seed_assistant(&hl, ASSISTANT, Utc::now());
    let request = hl.requests().open(&ctx(), UserId::new(USER)).unwrap();
    let request_id = request.id.clone();
    drop(hl);

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let barrier = Arc::clone(&barrier);
        let path = path.clone();
        let request_id = request_id.clone();
        handles.push(thread::spawn(move || {
            let hl = helpline_at(&path, HelplineConfig::default());
            barrier.wait();
            hl.requests().decide(
                &ctx(),
                &request_id,
                AssistantId::new(ASSISTANT),
                Decision::Accept,
            )
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();
    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1, "exactly one accept wins: {results:?}");
    let losers = results
        .iter()
        .filter(|result| {
            matches!(
                result,
                Err(HelplineError::Request(RequestError::InvalidState { .. }))
                    | Err(HelplineError::Assistant(_))
            )
        })
        .count();
    assert_eq!(losers, 1);

    // No double-busy assistant, one in-progress request.
    let hl = helpline_at(&path, HelplineConfig::default());
    let request = hl.requests().get(&request_id).unwrap().unwrap();
    assert_eq!(request.status, RequestStatus::InProgress);
    let assistant = hl.assistants().get(AssistantId::new(ASSISTANT)).unwrap().unwrap();
    assert!(assistant.is_busy);
}

#[test]
fn concurrent_opens_keep_one_active_request_per_user() {
    let (_dir, path) = db_file();
    let hl = helpline_at(&path, HelplineConfig::default());
    common::seed_assistant(&hl, ASSISTANT, Utc::now());
    drop(hl);

    let barrier = Arc::new(Barrier::new(4));
    let mut handles = Vec::new();
    for _ in 0..4 {
        let barrier = Arc::clone(&barrier);
        let path = path.clone();
        handles.push(thread::spawn(move || {
            let hl = helpline_at(&path, HelplineConfig::default());
            barrier.wait();
            hl.requests().open(&ctx(), UserId::new(USER))
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();
    let opened = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(opened, 1, "one open wins: {results:?}");
    assert!(results.iter().all(|result| matches!(
        result,
        Ok(_) | Err(HelplineError::Request(RequestError::ActiveRequestExists))
    )));

    let hl = helpline_at(&path, HelplineConfig::default());
    let active = hl
        .requests()
        .get_active_for_user(UserId::new(USER))
        .unwrap();
    assert!(active.is_some());
}

#[test]
fn concurrent_claims_produce_one_moderator() {
    let (_dir, path) = db_file();
    let hl = helpline_at(&path, HelplineConfig::default());
    let moderators = [MOD_A, MOD_B];
    for (index, id) in moderators.iter().enumerate() {
        hl.store()
            .moderators()
            .create(ModeratorId::new(*id), &format!("mod-{id}"), "hash")
            .unwrap();
        hl.store()
            .moderators()
            .touch(
                ModeratorId::new(*id),
                Utc::now() - Duration::minutes(index as i64),
            )
            .unwrap();
    }
    let arbitration = hl
        .arbitrations()
        .open(
            &ctx(),
            OpenArbitrationInput {
                user_id: UserId::new(USER),
                user_nickname: "ada".to_string(),
                assistant_id: AssistantId::new(ASSISTANT),
                assistant_nickname: "grace".to_string(),
                reason: "unresolved".to_string(),
            },
        )
        .unwrap();
    let arbitration_id = arbitration.id.clone();
    drop(hl);

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for moderator in moderators {
        let barrier = Arc::clone(&barrier);
        let path = path.clone();
        let arbitration_id = arbitration_id.clone();
        handles.push(thread::spawn(move || {
            let hl = helpline_at(&path, HelplineConfig::default());
            barrier.wait();
            hl.arbitrations()
                .claim(&ctx(), &arbitration_id, ModeratorId::new(moderator))
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();
    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1, "exactly one claim wins: {results:?}");
    let already_claimed = results
        .iter()
        .filter(|result| {
            matches!(
                result,
                Err(HelplineError::Arbitration(ArbitrationError::AlreadyClaimed))
            )
        })
        .count();
    assert_eq!(already_claimed, 1);

    let hl = helpline_at(&path, HelplineConfig::default());
    let arbitration = hl.arbitrations().get(&arbitration_id).unwrap().unwrap();
    assert!(arbitration.moderator_id.is_some());
}
