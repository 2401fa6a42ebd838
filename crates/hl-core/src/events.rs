use crate::error::HelplineError;
use hl_events::types::EventRecord;

pub trait EventRepository {
    /// Assigns id and sequence number, inserts, and returns the stamped
    /// record.
    fn append(&self, event: EventRecord) -> Result<EventRecord, HelplineError>;
    fn list(&self, after: Option<i64>, limit: Option<u32>)
        -> Result<Vec<EventRecord>, HelplineError>;
}
