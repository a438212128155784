// Threat record storage and correlation
//
// Threat records live under `threat:<id>` and are free-form JSON documents
// with well-known optional fields (ip, domain, hash, type, timestamp).
// Correlation scores every other stored threat against a target by shared
// indicators and recency, keeping anything scoring above the threshold.

use serde_json::Value;
use std::sync::Arc;

use aegis_core::error::Result;
use aegis_core::traits::KeyValueStore;

const KEY_PREFIX: &str = "threat:";

/// Minimum score for a threat to count as correlated
const CORRELATION_THRESHOLD: f64 = 0.3;

/// Time window for the recency signal (24 hours, in milliseconds)
const CORRELATION_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Threat persistence and correlation over a KeyValueStore
#[derive(Clone)]
pub struct ThreatStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ThreatStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn key(id: &str) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }

    pub async fn put_threat(&self, id: &str, record: Value) -> Result<()> {
        self.kv.put(&Self::key(id), record).await
    }

    pub async fn get_threat(&self, id: &str) -> Result<Option<Value>> {
        self.kv.get(&Self::key(id)).await
    }

    pub async fn list_threats(&self) -> Result<Vec<(String, Value)>> {
        let records = self.kv.list(Some(KEY_PREFIX)).await?;
        Ok(records
            .into_iter()
            .map(|(k, v)| (k.trim_start_matches(KEY_PREFIX).to_string(), v))
            .collect())
    }

    /// Find threats correlated with `threat_id`, sorted by score descending.
    ///
    /// Each returned record carries a `correlationScore` field. Returns
    /// `Ok(None)` when the target threat does not exist.
    pub async fn correlate(
        &self,
        threat_id: &str,
        _correlation_type: &str,
    ) -> Result<Option<Vec<Value>>> {
        let Some(target) = self.get_threat(threat_id).await? else {
            return Ok(None);
        };

        let mut correlated = Vec::new();
        for (id, threat) in self.list_threats().await? {
            if id == threat_id {
                continue;
            }
            let score = correlation_score(&target, &threat);
            if score > CORRELATION_THRESHOLD {
                let mut entry = threat;
                if let Some(obj) = entry.as_object_mut() {
                    obj.insert("correlationScore".to_string(), score.into());
                }
                correlated.push(entry);
            }
        }

        correlated.sort_by(|a, b| {
            let sa = a["correlationScore"].as_f64().unwrap_or(0.0);
            let sb = b["correlationScore"].as_f64().unwrap_or(0.0);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(Some(correlated))
    }
}

fn shared_str(a: &Value, b: &Value, field: &str) -> bool {
    match (a.get(field).and_then(Value::as_str), b.get(field).and_then(Value::as_str)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Score two threat records by shared indicators:
/// hash 0.9, ip 0.8, domain 0.7, type 0.3, plus 0.2 if observed within
/// 24 hours of each other.
fn correlation_score(target: &Value, other: &Value) -> f64 {
    let mut score = 0.0;

    if shared_str(target, other, "ip") {
        score += 0.8;
    }
    if shared_str(target, other, "domain") {
        score += 0.7;
    }
    if shared_str(target, other, "hash") {
        score += 0.9;
    }
    if shared_str(target, other, "type") {
        score += 0.3;
    }

    if let (Some(a), Some(b)) = (
        target.get("timestamp").and_then(Value::as_i64),
        other.get("timestamp").and_then(Value::as_i64),
    ) {
        if (a - b).abs() < CORRELATION_WINDOW_MS {
            score += 0.2;
        }
    }

    score
}
