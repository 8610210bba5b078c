use std::fmt;

use async_trait::async_trait;
use castlist_model::PersonID;
use redis::aio::ConnectionManager;
use tracing::info;

use super::{PERSON_DELETED_STREAM, PersonDeletedEvent, PersonEvents};
use crate::error::{CatalogError, Result};

/// Publishes events onto a Redis stream with `XADD`.
///
/// Each entry carries a `key` field (`person_<id>`) and a JSON `value` field.
#[derive(Clone)]
pub struct RedisPersonEvents {
    conn: ConnectionManager,
    stream: String,
}

impl fmt::Debug for RedisPersonEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisPersonEvents")
            .field("connection", &"ConnectionManager")
            .field("stream", &self.stream)
            .finish()
    }
}

impl RedisPersonEvents {
    pub async fn connect(redis_url: &str, stream: Option<String>) -> Result<Self> {
        info!("Connecting to Redis event stream at {}", redis_url);

        let client = redis::Client::open(redis_url).map_err(|e| {
            CatalogError::Internal(format!("Failed to create Redis client: {e}"))
        })?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            CatalogError::Internal(format!("Failed to connect to Redis: {e}"))
        })?;

        Ok(Self {
            conn,
            stream: stream.unwrap_or_else(|| PERSON_DELETED_STREAM.to_string()),
        })
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }
}

#[async_trait]
impl PersonEvents for RedisPersonEvents {
    async fn person_deleted(&self, id: PersonID) -> Result<()> {
        let event = PersonDeletedEvent { person_id: id };
        let body = serde_json::to_string(&event).map_err(|e| {
            CatalogError::Internal(format!("Failed to encode event: {e}"))
        })?;

        let mut conn = self.conn.clone();
        let _entry: String = redis::cmd("XADD")
            .arg(&self.stream)
            .arg("*")
            .arg("key")
            .arg(event.key())
            .arg("value")
            .arg(body)
            .query_async(&mut conn)
            .await
            .map_err(|e| CatalogError::Internal(format!("Redis XADD failed: {e}")))?;
        Ok(())
    }
}
