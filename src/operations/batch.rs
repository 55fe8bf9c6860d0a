//! Sequential per-item processing with failure isolation.
//!
//! A failing item is recorded in the report and never aborts the batch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, RelayResult};
use crate::operations::OperationContext;
use crate::spapi::SpApiRequest;

/// Payload shape shared by every batch export: `{"data": [item, ...]}`.
#[derive(Debug, Deserialize)]
pub struct BatchPayload {
    pub data: Vec<Value>,
}

/// One item of a batch export.
pub trait BatchItem: DeserializeOwned {
    /// The SP-API call that applies this item.
    fn request(&self, ctx: &OperationContext) -> RelayResult<SpApiRequest>;

    fn success_message(&self) -> String;
}

/// Outcome of one batch item.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemOutcome {
    pub asin: Option<String>,
    pub sku: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result object of a batch export.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub success: bool,
    pub results: Vec<ItemOutcome>,
    pub message: String,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Apply every item in order and report each outcome.
pub async fn run_batch<T: BatchItem>(
    ctx: &OperationContext,
    items: Vec<Value>,
    description: &str,
) -> BatchReport {
    tracing::info!(items = items.len(), "Exporting {}", description);

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let asin = string_field(&item, "asin");
        let sku = string_field(&item, "sku");

        let outcome = match apply::<T>(ctx, item).await {
            Ok(message) => ItemOutcome {
                asin,
                sku,
                success: true,
                message: Some(message),
                error: None,
            },
            Err(e) => {
                tracing::warn!(asin = ?asin, sku = ?sku, error = %e, "Batch item failed");
                ItemOutcome {
                    asin,
                    sku,
                    success: false,
                    message: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(outcome);
    }

    let message = format!("Processed {} {}", results.len(), description);
    BatchReport {
        success: true,
        results,
        message,
    }
}

async fn apply<T: BatchItem>(ctx: &OperationContext, item: Value) -> RelayResult<String> {
    let item: T = serde_json::from_value(item)?;
    let request = item.request(ctx)?;
    ctx.call(request).await?;
    Ok(item.success_message())
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_string)
}

/// The item's SKU, or an error that fails just this item.
pub(crate) fn require_sku(sku: &Option<String>) -> RelayResult<&str> {
    match sku.as_deref() {
        Some(sku) if !sku.trim().is_empty() => Ok(sku),
        _ => Err(RelayError::InvalidRequest("item is missing sku".to_string())),
    }
}
