//! Listings Items API: multi-language update, delete and import.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{RelayError, RelayResult};
use crate::operations::{localized, parse_payload, OperationContext};
use crate::spapi::SpApiRequest;

const DEFAULT_PRODUCT_TYPE: &str = "PRODUCT";
const DEFAULT_BRAND: &str = "Generic";

fn listing_item(ctx: &OperationContext, sku: &str) -> [String; 5] {
    ["listings", "2021-08-01", "items", ctx.seller_id.as_str(), sku].map(str::to_string)
}

fn require_sku(sku: Option<String>) -> RelayResult<String> {
    sku.filter(|s| !s.trim().is_empty())
        .ok_or_else(|| RelayError::InvalidRequest("sku is required".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload {
    asin: Option<String>,
    sku: Option<String>,
    product_type: Option<String>,
    /// Language tag → content, in caller order.
    #[serde(default)]
    content: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageContent {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    bullet_points: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    keywords: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// JSON-Patch document for one language. `None` when the language has no
/// title and must be skipped.
fn language_patch(
    language: &str,
    content: &LanguageContent,
    product_type: &str,
    marketplace_id: &str,
) -> Option<Value> {
    let title = non_empty(&content.title)?;
    let brand = non_empty(&content.brand).unwrap_or(DEFAULT_BRAND);

    let mut patches = vec![
        json!({
            "op": "replace",
            "path": "/attributes/item_name",
            "value": [localized(title, language, marketplace_id)],
        }),
        json!({
            "op": "replace",
            "path": "/attributes/brand",
            "value": [localized(brand, language, marketplace_id)],
        }),
    ];

    if !content.bullet_points.is_empty() {
        let bullets: Vec<Value> = content
            .bullet_points
            .iter()
            .map(|bp| localized(bp.as_str(), language, marketplace_id))
            .collect();
        patches.push(json!({
            "op": "replace",
            "path": "/attributes/bullet_point",
            "value": bullets,
        }));
    }
    if let Some(description) = non_empty(&content.description) {
        patches.push(json!({
            "op": "replace",
            "path": "/attributes/product_description",
            "value": [localized(description, language, marketplace_id)],
        }));
    }
    if let Some(keywords) = non_empty(&content.keywords) {
        patches.push(json!({
            "op": "replace",
            "path": "/attributes/generic_keyword",
            "value": [localized(keywords, language, marketplace_id)],
        }));
    }

    Some(json!({"productType": product_type, "patches": patches}))
}

/// Result of one per-language PATCH.
#[derive(Debug, Serialize)]
struct LanguageResult {
    language: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `update` and `create`: one PATCH per language that has a title.
///
/// Languages are sent one at a time with the configured pause between
/// calls. Each language's result is recorded on its own; the operation
/// fails only when every language failed.
pub async fn update(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let UpdatePayload {
        asin,
        sku,
        product_type,
        content,
    } = parse_payload(payload)?;
    let sku = require_sku(sku)?;
    let product_type = product_type.unwrap_or_else(|| DEFAULT_PRODUCT_TYPE.to_string());

    let mut documents = Vec::new();
    for (language, raw) in content {
        let content: LanguageContent = serde_json::from_value(raw)?;
        if let Some(patch) = language_patch(&language, &content, &product_type, &ctx.marketplace_id) {
            documents.push((language, patch));
        }
    }

    let languages: Vec<String> = documents.iter().map(|(lang, _)| lang.clone()).collect();
    let mut results = Vec::with_capacity(documents.len());
    let mut last_error = None;

    for (index, (language, patch)) in documents.into_iter().enumerate() {
        if index > 0 && !ctx.settings.inter_call_delay.is_zero() {
            tokio::time::sleep(ctx.settings.inter_call_delay).await;
        }

        let request = SpApiRequest::new(Method::PATCH, listing_item(&ctx, &sku))
            .query("marketplaceIds", &ctx.marketplace_id)
            .query("issueLocale", &language)
            .json(patch);

        match ctx.call(request).await {
            Ok(response) => results.push(LanguageResult {
                language,
                success: true,
                status: Some(response.status),
                data: Some(response.body),
                error: None,
            }),
            Err(e) => {
                tracing::warn!(sku = %sku, language = %language, error = %e, "Listing language update failed");
                results.push(LanguageResult {
                    language,
                    success: false,
                    status: e.upstream_status(),
                    data: None,
                    error: Some(e.to_string()),
                });
                last_error = Some(e);
            }
        }
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    if succeeded == 0 {
        if let Some(e) = last_error {
            return Err(e.context("SP-API Listings Update failed"));
        }
    }

    let message = if succeeded == results.len() {
        format!("Updated {} languages successfully", succeeded)
    } else {
        format!(
            "Updated {} of {} languages successfully",
            succeeded,
            results.len()
        )
    };

    Ok(json!({
        "asin": asin,
        "sku": sku,
        "marketplace": ctx.marketplace,
        "languages": languages,
        "results": results,
        "message": message,
    }))
}

#[derive(Debug, Deserialize)]
struct DeletePayload {
    sku: Option<String>,
}

pub async fn delete(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let DeletePayload { sku } = parse_payload(payload)?;
    let sku = require_sku(sku)?;

    let request = SpApiRequest::new(Method::DELETE, listing_item(&ctx, &sku))
        .query("marketplaceIds", &ctx.marketplace_id);
    let response = ctx
        .call(request)
        .await
        .map_err(|e| e.context("SP-API Delete failed"))?;

    Ok(json!({
        "sku": sku,
        "marketplace": ctx.marketplace,
        "httpStatus": response.status,
        "message": "Product deleted successfully",
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportedProduct {
    asin: Option<String>,
    sku: Option<String>,
    product_type: Option<String>,
    brand: String,
}

impl ImportedProduct {
    fn from_listing(listing: &Value) -> Self {
        let text = |key: &str| listing.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            asin: text("asin"),
            sku: text("sku"),
            product_type: text("productType"),
            brand: listing
                .pointer("/attributes/brand/0/value")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// First page of the seller's listings.
pub async fn import_products(ctx: Arc<OperationContext>, _payload: Map<String, Value>) -> RelayResult<Value> {
    let request = SpApiRequest::new(Method::GET, ["listings", "2021-08-01", "items"])
        .query("sellerId", &ctx.seller_id)
        .query("marketplaceIds", &ctx.marketplace_id)
        .query("pageSize", ctx.settings.import_page_size);
    let response = ctx
        .call(request)
        .await
        .map_err(|e| e.context("Product import failed"))?;

    let products: Vec<ImportedProduct> = response
        .body
        .get("listings")
        .and_then(Value::as_array)
        .map(|listings| listings.iter().map(ImportedProduct::from_listing).collect())
        .unwrap_or_default();

    Ok(json!({
        "count": products.len(),
        "products": products,
        "marketplace": ctx.marketplace,
    }))
}
