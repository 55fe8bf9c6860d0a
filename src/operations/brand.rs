//! Brand strip and brand store exports.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{RelayError, RelayResult};
use crate::operations::batch::{run_batch, BatchItem, BatchPayload};
use crate::operations::{parse_payload, OperationContext};
use crate::spapi::SpApiRequest;

#[derive(Debug, Deserialize)]
struct BrandStripItem {
    asin: Option<String>,
    enabled: Option<Value>,
    #[serde(rename = "type")]
    strip_type: Option<String>,
    classic: Option<Value>,
    enhanced: Option<Value>,
}

impl BatchItem for BrandStripItem {
    fn request(&self, ctx: &OperationContext) -> RelayResult<SpApiRequest> {
        let asin = match self.asin.as_deref() {
            Some(asin) if !asin.trim().is_empty() => asin,
            _ => return Err(RelayError::InvalidRequest("item is missing asin".to_string())),
        };
        let content = if self.strip_type.as_deref() == Some("Classic") {
            &self.classic
        } else {
            &self.enhanced
        };

        Ok(
            SpApiRequest::new(Method::PUT, ["aplus", "2020-11-01", "contentDocuments", "brandStrip", asin])
                .query("marketplaceId", &ctx.marketplace_id)
                .json(json!({
                    "productIdentifier": {"marketplaceId": ctx.marketplace_id, "asin": asin},
                    "brandStrip": {
                        "enabled": self.enabled,
                        "type": self.strip_type,
                        "content": content,
                    }
                })),
        )
    }

    fn success_message(&self) -> String {
        "Brand strip updated successfully".to_string()
    }
}

pub async fn export_brand_strip(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let BatchPayload { data } = parse_payload(payload)?;
    let report = run_batch::<BrandStripItem>(&ctx, data, "brand strip updates").await;
    Ok(serde_json::to_value(report)?)
}

#[derive(Debug, Deserialize)]
struct StorePayload {
    data: StoreDefinition,
}

#[derive(Debug, Deserialize)]
struct StoreDefinition {
    #[serde(default)]
    config: Value,
    #[serde(default)]
    pages: Vec<Value>,
}

/// Publish the whole brand store in one call.
///
/// An upstream failure is reported in the result (`success: false`) rather
/// than as an error envelope.
pub async fn export_brand_store(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let StorePayload { data } = parse_payload(payload)?;
    let page_count = data.pages.len();
    tracing::info!(pages = page_count, "Exporting brand store");

    let request = SpApiRequest::new(Method::PUT, ["stores", "2020-07-01", "brands", ctx.seller_id.as_str(), "store"])
        .query("marketplaceId", &ctx.marketplace_id)
        .json(json!({
            "marketplaceId": ctx.marketplace_id,
            "storeConfiguration": data.config,
            "pages": data.pages,
        }));

    match ctx.call(request).await {
        Ok(response) => {
            let store_id = response
                .body
                .get("storeId")
                .and_then(Value::as_str)
                .unwrap_or("N/A");
            Ok(json!({
                "success": true,
                "message": format!("Brand store updated successfully with {} pages", page_count),
                "storeId": store_id,
            }))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Brand store export failed");
            Ok(json!({"success": false, "error": e.to_string()}))
        }
    }
}
