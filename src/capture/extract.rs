//! Asset records from media-library API responses.
//!
//! The library has served several response shapes over time; every known
//! field spelling is tried in a fixed order.

use serde_json::Value;

use crate::capture::asset::AssetRecord;

/// URL fragments of the media-library endpoints worth inspecting.
pub const URL_MARKERS: [&str; 3] = ["searchMediaMetadata", "getMediaMetadata", "media-library"];

pub fn is_media_url(url: &str) -> bool {
    URL_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Record list of a response body, or nothing for unknown shapes.
fn record_list(body: &Value) -> &[Value] {
    for key in ["mediaMetadataRecords", "results", "media"] {
        if let Some(list) = body.get(key).and_then(Value::as_array) {
            return list;
        }
    }
    body.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Non-empty text form of a scalar.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(record.get(*key)))
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Positive dimension, accepting numbers and numeric strings.
fn dimension(value: Option<&Value>) -> Option<u64> {
    let parsed = match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|d| *d > 0)
}

fn tags(record: &Value) -> Vec<String> {
    let scalar = |v: &Value| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(v.to_string()),
        _ => None,
    };

    if let Some(list) = record.get("tags").and_then(Value::as_array) {
        return list.iter().filter_map(scalar).collect();
    }
    for key in ["keywords", "labels"] {
        match record.get(key) {
            Some(Value::Array(list)) => return list.iter().filter_map(scalar).collect(),
            Some(value) if !value.is_null() => {
                if let Some(tag) = scalar(value).filter(|t| !t.is_empty()) {
                    return vec![tag];
                }
            }
            _ => {}
        }
    }
    Vec::new()
}

/// Build one record. `None` when no usable id exists.
pub fn extract_record(record: &Value) -> Option<AssetRecord> {
    let raw_id = first_text(record, &["mediaId", "assetId", "id", "uploadDestinationId"])?;
    let asset_id = last_segment(&raw_id).to_string();
    if asset_id.is_empty() {
        return None;
    }

    let filename = first_text(record, &["fileName", "filename", "name"])
        .or_else(|| {
            text(record.get("uploadDestinationId"))
                .map(|dest| last_segment(&dest).to_string())
                .filter(|f| !f.is_empty())
        })
        .or_else(|| asset_id.contains('.').then(|| asset_id.clone()))
        .unwrap_or_default();

    let mut width = dimension(record.get("width")).unwrap_or(0);
    let mut height = dimension(record.get("height")).unwrap_or(0);
    for nested in ["dimensions", "imageMetadata"] {
        if let Some(block) = record.get(nested) {
            width = dimension(block.get("width")).unwrap_or(width);
            height = dimension(block.get("height")).unwrap_or(height);
        }
    }

    Some(AssetRecord {
        asset_id,
        filename,
        tags: tags(record),
        width,
        height,
    })
}

/// Every usable record in a response body.
pub fn extract_assets(body: &Value) -> Vec<AssetRecord> {
    record_list(body).iter().filter_map(extract_record).collect()
}
