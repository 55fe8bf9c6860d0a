//! Listing images and the video placeholder.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{RelayError, RelayResult};
use crate::operations::{parse_payload, OperationContext};
use crate::spapi::SpApiRequest;

#[derive(Debug, Deserialize)]
struct ImageRef {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageSet {
    main_image: Option<ImageRef>,
    #[serde(default)]
    additional_images: Vec<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ImagesPayload {
    asin: Option<String>,
    sku: Option<String>,
    #[serde(default)]
    images: ImageSet,
}

fn locator(url: &str, marketplace_id: &str) -> Value {
    json!({"media_location": url, "marketplace_id": marketplace_id})
}

/// Patches for the main and additional image locators, plus the number of
/// images they reference.
fn image_patches(images: &ImageSet, marketplace_id: &str) -> (Vec<Value>, usize) {
    let mut patches = Vec::new();
    let mut count = 0;

    if let Some(url) = images.main_image.as_ref().and_then(|img| img.url.as_deref()) {
        patches.push(json!({
            "op": "replace",
            "path": "/attributes/main_product_image_locator",
            "value": [locator(url, marketplace_id)],
        }));
        count += 1;
    }

    let additional: Vec<Value> = images
        .additional_images
        .iter()
        .filter_map(|img| img.url.as_deref())
        .map(|url| locator(url, marketplace_id))
        .collect();
    if !additional.is_empty() {
        count += additional.len();
        patches.push(json!({
            "op": "replace",
            "path": "/attributes/other_product_image_locator",
            "value": additional,
        }));
    }

    (patches, count)
}

pub async fn upload_images(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let ImagesPayload { asin, sku, images } = parse_payload(payload)?;
    let sku = sku
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| RelayError::InvalidRequest("sku is required".to_string()))?;

    let (patches, count) = image_patches(&images, &ctx.marketplace_id);
    if count == 0 {
        return Err(RelayError::InvalidRequest("no image URLs supplied".to_string()));
    }

    let request = SpApiRequest::new(
        Method::PATCH,
        ["listings", "2021-08-01", "items", ctx.seller_id.as_str(), sku.as_str()],
    )
    .query("marketplaceIds", &ctx.marketplace_id)
    .json(json!({"productType": "PRODUCT", "patches": patches}));

    ctx.call(request)
        .await
        .map_err(|e| e.context("Image upload failed"))?;

    Ok(json!({
        "asin": asin,
        "sku": sku,
        "marketplace": ctx.marketplace,
        "imagesUploaded": count,
        "message": "Images uploaded successfully",
    }))
}

#[derive(Debug, Deserialize)]
struct VideosPayload {
    asin: Option<String>,
    sku: Option<String>,
}

/// No SP-API resource accepts listing videos for sellers; answers with
/// guidance instead of calling upstream.
pub async fn upload_videos(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let VideosPayload { asin, sku } = parse_payload(payload)?;
    Ok(json!({
        "asin": asin,
        "sku": sku,
        "marketplace": ctx.marketplace,
        "message": "Video upload requires additional API access. Please use Seller Central for now.",
    }))
}
