//! A+ content publishing.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::RelayResult;
use crate::operations::{parse_payload, OperationContext};
use crate::spapi::SpApiRequest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AplusPayload {
    #[serde(default)]
    content_type: Option<String>,
    data: AplusData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AplusData {
    asin: Option<String>,
    language: Option<String>,
    module_type: Option<String>,
    #[serde(default)]
    content: AplusContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AplusContent {
    #[serde(default)]
    images: Vec<ImageRef>,
    heading: Option<String>,
    tagline: Option<String>,
    hero_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    url: Option<String>,
}

/// Content document for `BASIC` (standard logo module) or, for any other
/// content type, a premium brand-story header.
fn content_document(content_type: Option<&str>, data: &AplusData) -> Value {
    let asin = data.asin.as_deref().unwrap_or_default();

    if content_type == Some("BASIC") {
        let logo = data
            .content
            .images
            .first()
            .and_then(|img| img.url.as_deref())
            .unwrap_or_default();
        json!({
            "contentDocument": {
                "name": format!("A+ Content for {}", asin),
                "contentType": "EBC",
                "locale": data.language,
                "contentModuleList": [{
                    "contentModuleType": data.module_type.as_deref().unwrap_or("STANDARD_COMPANY_LOGO"),
                    "standardCompanyLogo": {
                        "companyLogo": {"uploadDestinationId": logo},
                        "companyLogoBrand": data.content.heading.as_deref().unwrap_or_default(),
                    }
                }]
            }
        })
    } else {
        json!({
            "contentDocument": {
                "name": format!("Brand Story for {}", asin),
                "contentType": "EBC_PREMIUM",
                "locale": data.language,
                "contentModuleList": [{
                    "contentModuleType": "STANDARD_HEADER_IMAGE_TEXT",
                    "standardHeaderImageText": {
                        "headline": {"value": data.content.tagline.as_deref().unwrap_or("Brand Story")},
                        "block": {
                            "image": {"uploadDestinationId": data.content.hero_image.as_deref().unwrap_or_default()}
                        }
                    }
                }]
            }
        })
    }
}

pub async fn publish(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let AplusPayload { content_type, data } = parse_payload(payload)?;
    let document = content_document(content_type.as_deref(), &data);

    let request = SpApiRequest::new(Method::POST, ["aplus", "2020-11-01", "contentDocuments"])
        .query("marketplaceId", &ctx.marketplace_id)
        .json(document);
    let response = ctx
        .call(request)
        .await
        .map_err(|e| e.context("A+ Content publish failed"))?;

    Ok(json!({
        "contentId": response.body.get("contentReferenceKey").cloned().unwrap_or(Value::Null),
        "asin": data.asin,
        "marketplace": ctx.marketplace,
        "message": "A+ Content published successfully",
    }))
}
