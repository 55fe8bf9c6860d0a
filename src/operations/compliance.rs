//! Per-listing compliance exports: GPSR data, documents, customization and
//! videos. Each is a batch of items applied one call per item.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::RelayResult;
use crate::operations::batch::{require_sku, run_batch, BatchItem, BatchPayload};
use crate::operations::{parse_payload, OperationContext};
use crate::spapi::SpApiRequest;

/// `/listings/2021-08-01/items/{sellerId}/{sku}/{resource}`
fn listing_resource(ctx: &OperationContext, sku: &str, resource: &str) -> [String; 6] {
    ["listings", "2021-08-01", "items", ctx.seller_id.as_str(), sku, resource].map(str::to_string)
}

fn product_identifier(ctx: &OperationContext, asin: &Option<String>) -> Value {
    json!({"marketplaceId": ctx.marketplace_id, "asin": asin})
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GpsrItem {
    asin: Option<String>,
    sku: Option<String>,
    /// Spreadsheet flag; only the literal `Yes` counts as compliant.
    #[serde(default)]
    gpsr_compliant: Option<String>,
    manufacturer: Option<Value>,
    importer: Option<Value>,
    responsible_person: Option<Value>,
    documents: Option<Value>,
}

impl BatchItem for GpsrItem {
    fn request(&self, ctx: &OperationContext) -> RelayResult<SpApiRequest> {
        let sku = require_sku(&self.sku)?;
        Ok(SpApiRequest::new(Method::PUT, listing_resource(ctx, sku, "compliance"))
            .query("marketplaceIds", &ctx.marketplace_id)
            .json(json!({
                "productIdentifier": product_identifier(ctx, &self.asin),
                "complianceData": {
                    "gpsrCompliant": self.gpsr_compliant.as_deref() == Some("Yes"),
                    "manufacturer": self.manufacturer,
                    "importer": self.importer,
                    "responsiblePerson": self.responsible_person,
                    "safetyDocuments": self.documents,
                }
            })))
    }

    fn success_message(&self) -> String {
        "GPSR data updated successfully".to_string()
    }
}

pub async fn export_gpsr(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let BatchPayload { data } = parse_payload(payload)?;
    let report = run_batch::<GpsrItem>(&ctx, data, "GPSR compliance updates").await;
    Ok(serde_json::to_value(report)?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentItem {
    asin: Option<String>,
    sku: Option<String>,
    document_type: Option<String>,
    language: Option<String>,
    title: Option<String>,
    pdf_url: Option<String>,
    description: Option<String>,
    visible_to_customer: Option<Value>,
}

impl BatchItem for DocumentItem {
    fn request(&self, ctx: &OperationContext) -> RelayResult<SpApiRequest> {
        let sku = require_sku(&self.sku)?;
        Ok(SpApiRequest::new(Method::POST, listing_resource(ctx, sku, "documents"))
            .query("marketplaceIds", &ctx.marketplace_id)
            .json(json!({
                "productIdentifier": product_identifier(ctx, &self.asin),
                "document": {
                    "type": self.document_type,
                    "language": self.language,
                    "title": self.title,
                    "url": self.pdf_url,
                    "description": self.description,
                    "visibleToCustomer": self.visible_to_customer,
                }
            })))
    }

    fn success_message(&self) -> String {
        "Document uploaded successfully".to_string()
    }
}

pub async fn export_documents(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let BatchPayload { data } = parse_payload(payload)?;
    let report = run_batch::<DocumentItem>(&ctx, data, "document uploads").await;
    Ok(serde_json::to_value(report)?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomizationItem {
    asin: Option<String>,
    sku: Option<String>,
    enabled: Option<Value>,
    text_customization: Option<Value>,
    surface_customization: Option<Value>,
    image_upload: Option<Value>,
    pricing: Option<Value>,
    gift_options: Option<Value>,
}

impl BatchItem for CustomizationItem {
    fn request(&self, ctx: &OperationContext) -> RelayResult<SpApiRequest> {
        let sku = require_sku(&self.sku)?;
        Ok(SpApiRequest::new(Method::PUT, listing_resource(ctx, sku, "customization"))
            .query("marketplaceIds", &ctx.marketplace_id)
            .json(json!({
                "productIdentifier": product_identifier(ctx, &self.asin),
                "customization": {
                    "enabled": self.enabled,
                    "textFields": self.text_customization,
                    "surfaces": self.surface_customization,
                    "imageUpload": self.image_upload,
                    "pricing": self.pricing,
                    "giftOptions": self.gift_options,
                }
            })))
    }

    fn success_message(&self) -> String {
        "Customization updated successfully".to_string()
    }
}

pub async fn export_customization(
    ctx: Arc<OperationContext>,
    payload: Map<String, Value>,
) -> RelayResult<Value> {
    let BatchPayload { data } = parse_payload(payload)?;
    let report = run_batch::<CustomizationItem>(&ctx, data, "customization updates").await;
    Ok(serde_json::to_value(report)?)
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    url: Option<String>,
    thumbnail: Option<String>,
    duration: Option<Value>,
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    asin: Option<String>,
    sku: Option<String>,
    #[serde(default)]
    videos: Vec<Video>,
}

impl BatchItem for VideoItem {
    fn request(&self, ctx: &OperationContext) -> RelayResult<SpApiRequest> {
        let sku = require_sku(&self.sku)?;
        Ok(SpApiRequest::new(Method::POST, listing_resource(ctx, sku, "videos"))
            .query("marketplaceIds", &ctx.marketplace_id)
            .json(json!({
                "productIdentifier": product_identifier(ctx, &self.asin),
                "videos": self.videos,
            })))
    }

    fn success_message(&self) -> String {
        format!("{} videos uploaded successfully", self.videos.len())
    }
}

pub async fn export_videos(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let BatchPayload { data } = parse_payload(payload)?;
    let report = run_batch::<VideoItem>(&ctx, data, "video uploads").await;
    Ok(serde_json::to_value(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::testing::{self, payload};
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_gpsr_flag_and_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/listings/2021-08-01/items/A1SELLER/SKU-1/compliance"))
            .and(query_param("marketplaceIds", testing::MARKETPLACE_ID))
            .and(body_partial_json(json!({
                "productIdentifier": {"asin": "B01"},
                "complianceData": {"gpsrCompliant": true, "manufacturer": "ACME GmbH"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = export_gpsr(
            testing::context(&server.uri()),
            payload(json!({"data": [
                {"asin": "B01", "sku": "SKU-1", "gpsrCompliant": "Yes", "manufacturer": "ACME GmbH"}
            ]})),
        )
        .await
        .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["message"], "Processed 1 GPSR compliance updates");
        assert_eq!(result["results"][0]["message"], "GPSR data updated successfully");
    }

    #[tokio::test]
    async fn test_videos_report_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/listings/2021-08-01/items/A1SELLER/SKU-V/videos"))
            .and(body_partial_json(json!({"videos": [{"url": "https://v/1.mp4", "type": "MAIN"}]})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let result = export_videos(
            testing::context(&server.uri()),
            payload(json!({"data": [
                {"asin": "B02", "sku": "SKU-V", "videos": [
                    {"url": "https://v/1.mp4", "type": "MAIN"},
                    {"url": "https://v/2.mp4"}
                ]}
            ]})),
        )
        .await
        .unwrap();

        assert_eq!(result["results"][0]["message"], "2 videos uploaded successfully");
    }

    #[tokio::test]
    async fn test_missing_data_is_invalid_request() {
        let err = export_documents(testing::context("http://127.0.0.1:9"), payload(json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidRequest);
    }
}
