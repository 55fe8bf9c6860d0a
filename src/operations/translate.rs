//! Placeholder translation. No translation backend is wired in; each target
//! gets the source text tagged with the language pair.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::RelayResult;
use crate::operations::{parse_payload, OperationContext};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatePayload {
    #[serde(default)]
    text: String,
    #[serde(default)]
    source_lang: String,
    #[serde(default)]
    target_langs: Vec<String>,
}

pub async fn translate(_ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let TranslatePayload {
        text,
        source_lang,
        target_langs,
    } = parse_payload(payload)?;

    let translations: Map<String, Value> = target_langs
        .into_iter()
        .map(|target| {
            let translated = format!("[Translated from {} to {}] {}", source_lang, target, text);
            (target, Value::String(translated))
        })
        .collect();

    Ok(json!({
        "translations": translations,
        "message": "Translation complete (using placeholder service)",
    }))
}
