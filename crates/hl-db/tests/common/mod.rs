#![allow(dead_code)]

use chrono::{DateTime, Utc};
use hl_core::assistants::AssistantRepository;
use hl_core::store::Store;
use hl_core::types::{Assistant, AssistantId};
use hl_core::{Helpline, HelplineConfig, RequestContext};
use hl_db::schema;
use hl_db::store::DbStore;
use hl_events::bus::EventBus;
use hl_events::types::EventSource;

pub fn helpline() -> Helpline<DbStore> {
    helpline_with_config(HelplineConfig::default())
}

pub fn helpline_with_config(config: HelplineConfig) -> Helpline<DbStore> {
    let conn = schema::with_test_db().expect("in-memory db");
    Helpline::new(DbStore::new(conn), EventBus::new(64), config)
}

pub fn helpline_at(path: &str, config: HelplineConfig) -> Helpline<DbStore> {
    let conn = schema::open_and_migrate(path).expect("on-disk db");
    Helpline::new(DbStore::new(conn), EventBus::new(64), config)
}

pub fn ctx() -> RequestContext {
    RequestContext::new(EventSource::Cli, None)
}

/// Create an on-shift assistant, stamped with the given activity time so
/// selection order is deterministic in tests.
pub fn seed_assistant(
    helpline: &Helpline<DbStore>,
    id: i64,
    last_active_at: DateTime<Utc>,
) -> Assistant {
    let assistants = helpline.store().assistants();
    assistants
        .create(AssistantId::new(id))
        .expect("create assistant");
    assistants
        .set_working(AssistantId::new(id), true)
        .expect("set working");
    assistants
        .touch(AssistantId::new(id), last_active_at)
        .expect("touch assistant")
}

/// Rewrite a timestamp column directly; the sweeper only believes what the
/// store says about time.
pub fn backdate(
    helpline: &Helpline<DbStore>,
    table: &str,
    column: &str,
    id_column: &str,
    id: &str,
    at: DateTime<Utc>,
) {
    let sql = format!("UPDATE {table} SET {column} = ?1 WHERE {id_column} = ?2");
    helpline
        .store()
        .connection()
        .execute(&sql, (at.to_rfc3339(), id))
        .expect("backdate row");
}
