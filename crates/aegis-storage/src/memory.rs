// In-memory key-value backend
// Decision: Use parking_lot for thread-safe access
//
// Implements the KeyValueStore contract over a BTreeMap, which keeps keys
// ordered and makes prefix listing a range scan. All data is lost on
// restart; durability is a property of the deployment's storage backend,
// not of this engine.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

use aegis_core::error::Result;
use aegis_core::traits::KeyValueStore;

/// In-memory KeyValueStore for dev mode and tests
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<(String, Value)>> {
        let entries = self.entries.read();
        let result = match prefix {
            Some(prefix) => entries
                .range(prefix.to_string()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = MemoryStore::new();
        store.put("workflow:a", json!({"x": 1})).await.unwrap();

        assert_eq!(
            store.get("workflow:a").await.unwrap(),
            Some(json!({"x": 1}))
        );
        assert!(store.delete("workflow:a").await.unwrap());
        assert!(!store.delete("workflow:a").await.unwrap());
        assert_eq!(store.get("workflow:a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_is_last_write_wins() {
        let store = MemoryStore::new();
        store.put("k", json!(1)).await.unwrap();
        store.put("k", json!(2)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn list_restricts_to_prefix() {
        let store = MemoryStore::new();
        store.put("workflow:1", json!("w1")).await.unwrap();
        store.put("workflow:2", json!("w2")).await.unwrap();
        store.put("threat:1", json!("t1")).await.unwrap();

        let workflows = store.list(Some("workflow:")).await.unwrap();
        assert_eq!(workflows.len(), 2);
        assert!(workflows.iter().all(|(k, _)| k.starts_with("workflow:")));

        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
