// data_collection executor
//
// Fetches from a configurable list of external sources. Individual source
// failures are logged and skipped; the step as a whole only reports what it
// managed to collect.

use aegis_core::workflow::StepDefinition;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::warn;

use super::ExecutorContext;
use crate::outcome::StepOutcome;

pub async fn execute(
    ctx: &ExecutorContext,
    step: &StepDefinition,
    _parameters: &Value,
) -> StepOutcome {
    let sources = step
        .config
        .get("sources")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut collected = Vec::new();
    for source in &sources {
        let Some(url) = source.get("url").and_then(Value::as_str) else {
            warn!(step = %step.name, "Skipping source without url");
            continue;
        };
        match fetch_source(ctx, url, source).await {
            Ok(entry) => collected.push(entry),
            Err(e) => {
                warn!(step = %step.name, url = %url, error = %e, "Source fetch failed, skipping");
            }
        }
    }

    let count = collected.len();
    StepOutcome::success(json!({
        "success": true,
        "collected": collected,
        "count": count,
        "sources": sources.len(),
    }))
}

async fn fetch_source(
    ctx: &ExecutorContext,
    url: &str,
    source: &Value,
) -> anyhow::Result<Value> {
    let method = source
        .get("method")
        .and_then(Value::as_str)
        .map(|m| Method::from_bytes(m.to_uppercase().as_bytes()))
        .transpose()?
        .unwrap_or(Method::GET);

    let mut request = ctx.http.request(method, url);
    if let Some(headers) = source.get("headers").and_then(Value::as_object) {
        for (name, value) in headers {
            if let Some(value) = value.as_str() {
                request = request.header(name, value);
            }
        }
    }

    let response = request.send().await?;
    let status = response.status().as_u16();
    let text = response.text().await?;
    // Keep JSON payloads structured, fall back to raw text
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

    Ok(json!({
        "source": url,
        "status": status,
        "data": body,
    }))
}
