//! Result envelopes.
//!
//! Success: HTTP 200 `{"status": "SUCCESS", ...result}`.
//! Failure: HTTP 500 `{"status": "ERROR", "kind", "message", "stack"?}`;
//! `stack` carries the error chain and is only present when error detail
//! is exposed (development environment).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use crate::error::RelayError;

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_ERROR: &str = "ERROR";

pub fn success_body(result: Map<String, Value>) -> Value {
    let mut body = Map::with_capacity(result.len() + 1);
    body.insert("status".to_string(), Value::from(STATUS_SUCCESS));
    for (key, value) in result {
        if key == "status" {
            tracing::warn!("Handler result carried a status key, dropped");
            continue;
        }
        body.insert(key, value);
    }
    Value::Object(body)
}

pub fn error_body(err: &RelayError, expose_detail: bool) -> Value {
    let mut body = json!({
        "status": STATUS_ERROR,
        "kind": err.kind(),
        "message": err.to_string(),
    });
    if expose_detail {
        body["stack"] = json!(err.chain());
    }
    body
}

pub fn success(result: Map<String, Value>) -> Response {
    (StatusCode::OK, Json(success_body(result))).into_response()
}

pub fn error(err: &RelayError, expose_detail: bool) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body(err, expose_detail))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_merges_result_after_status() {
        let mut result = Map::new();
        result.insert("sku".into(), json!("MUG-01"));
        result.insert("status".into(), json!(200));

        let body = success_body(result);
        assert_eq!(body, json!({"status": "SUCCESS", "sku": "MUG-01"}));
        assert_eq!(body.as_object().unwrap().keys().next().unwrap(), "status");
    }

    #[test]
    fn test_error_hides_stack_outside_development() {
        let err = RelayError::Upstream {
            status: 404,
            message: "SKU not found".into(),
        }
        .context("SP-API Delete failed");

        let body = error_body(&err, false);
        assert_eq!(
            body,
            json!({"status": "ERROR", "kind": "PERMANENT", "message": "SP-API Delete failed: SKU not found"})
        );

        let body = error_body(&err, true);
        assert_eq!(body["stack"], json!(["SP-API Delete failed: SKU not found", "SKU not found"]));
    }
}
