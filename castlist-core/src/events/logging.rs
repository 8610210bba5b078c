use async_trait::async_trait;
use castlist_model::PersonID;
use tracing::info;

use super::{PERSON_DELETED_STREAM, PersonDeletedEvent, PersonEvents};
use crate::error::Result;

/// Sink that only writes events to the log. Used when no broker is set up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPersonEvents;

#[async_trait]
impl PersonEvents for LogPersonEvents {
    async fn person_deleted(&self, id: PersonID) -> Result<()> {
        let event = PersonDeletedEvent { person_id: id };
        info!(stream = PERSON_DELETED_STREAM, key = %event.key(), "person deleted");
        Ok(())
    }
}
