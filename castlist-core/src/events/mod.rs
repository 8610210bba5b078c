//! Best-effort person lifecycle notifications.

mod logging;
mod redis_stream;

use std::sync::Arc;

use async_trait::async_trait;
use castlist_model::PersonID;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::Result;

pub use logging::LogPersonEvents;
pub use redis_stream::RedisPersonEvents;

/// Stream (topic) name deletion events are published to.
pub const PERSON_DELETED_STREAM: &str = "person_deleted";

/// Payload of a deletion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDeletedEvent {
    pub person_id: PersonID,
}

impl PersonDeletedEvent {
    /// Partition / message key of the event.
    pub fn key(&self) -> String {
        format!("person_{}", self.person_id)
    }
}

/// Notification sink. Delivery is at most once and never acknowledged.
#[async_trait]
pub trait PersonEvents: Send + Sync {
    async fn person_deleted(&self, id: PersonID) -> Result<()>;
}

/// Publish a deletion event for each id on a detached task.
///
/// The task owns everything it needs, so the caller can drop the handle and
/// return immediately. Failures are logged and never retried.
pub fn spawn_person_deleted(
    events: Arc<dyn PersonEvents>,
    ids: Vec<PersonID>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for id in ids {
            match events.person_deleted(id).await {
                Ok(()) => debug!(person_id = %id, "person_deleted event sent"),
                Err(e) => {
                    error!(person_id = %id, error = %e, "Failed to send person_deleted event")
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_person_id_field() {
        let event = PersonDeletedEvent {
            person_id: PersonID(12),
        };
        assert_eq!(
            serde_json::to_string(&event).expect("json"),
            r#"{"person_id":12}"#
        );
        assert_eq!(event.key(), "person_12");
    }
}
