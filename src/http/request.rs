//! Inbound request handling.

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::{RelayError, RelayResult};
use crate::routing::OperationRequest;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request id set by the request-id layer, or a fresh one when absent.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Decode a request body into an operation request.
pub fn decode(body: &[u8]) -> RelayResult<OperationRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RelayError::InvalidRequest("empty request body".to_string()));
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-42"));
        assert_eq!(request_id(&headers), "req-42");
    }

    #[test]
    fn test_request_id_generated_when_missing() {
        let id = request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_decode() {
        let request = decode(br#"{"operation": "translate", "text": "hi"}"#).unwrap();
        assert_eq!(request.operation, "translate");

        assert!(matches!(decode(b"  "), Err(RelayError::InvalidRequest(_))));
        assert!(matches!(decode(b"{not json"), Err(RelayError::InvalidRequest(_))));
        assert!(matches!(decode(b"[1, 2]"), Err(RelayError::InvalidRequest(_))));
    }
}
