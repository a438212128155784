// Notification record storage
//
// Notifications produced by workflow steps are persisted under
// `notification:<id>` before any delivery attempt, so a failed webhook
// never loses the record.

use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use aegis_core::error::Result;
use aegis_core::traits::KeyValueStore;

const KEY_PREFIX: &str = "notification:";

/// Notification persistence over a KeyValueStore
#[derive(Clone)]
pub struct NotificationStore {
    kv: Arc<dyn KeyValueStore>,
}

impl NotificationStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Persist a notification record, returning its generated id
    pub async fn create(
        &self,
        title: &str,
        severity: &str,
        body: Value,
    ) -> Result<Uuid> {
        let id = Uuid::now_v7();
        let record = json!({
            "id": id,
            "title": title,
            "severity": severity,
            "body": body,
            "createdAt": Utc::now(),
        });
        self.kv.put(&format!("{}{}", KEY_PREFIX, id), record).await?;
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Value>> {
        self.kv.get(&format!("{}{}", KEY_PREFIX, id)).await
    }

    pub async fn list(&self) -> Result<Vec<Value>> {
        let records = self.kv.list(Some(KEY_PREFIX)).await?;
        Ok(records.into_iter().map(|(_, v)| v).collect())
    }
}
