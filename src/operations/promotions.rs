//! Coupons and promotions.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{RelayError, RelayResult};
use crate::operations::{parse_payload, OperationContext};
use crate::spapi::SpApiRequest;

const DEFAULT_DISCOUNT: f64 = 10.0;
const DEFAULT_BUDGET: f64 = 1000.0;

#[derive(Debug, Deserialize)]
struct CouponPayload {
    coupon: Coupon,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Coupon {
    asin: Option<String>,
    coupon_type: Option<String>,
    start_date: String,
    end_date: String,
    /// Number or numeric string; the sheet sends either.
    #[serde(default)]
    discount_value: Value,
    #[serde(default)]
    total_budget: Value,
    currency: Option<String>,
    customer_type: Option<String>,
}

/// Parse a spreadsheet amount, falling back when missing, unparsable or zero.
fn amount_or(value: &Value, fallback: f64) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v != 0.0 && v.is_finite() => v,
        _ => fallback,
    }
}

/// RFC 3339 timestamp or plain `YYYY-MM-DD` (midnight UTC), rendered as
/// `2024-05-01T00:00:00.000Z`.
fn iso_timestamp(field: &str, raw: &str) -> RelayResult<String> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
        .ok_or_else(|| RelayError::InvalidRequest(format!("{} is not a valid date: {:?}", field, raw)))?;
    Ok(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn coupon_body(coupon: &Coupon) -> RelayResult<Value> {
    Ok(json!({
        "couponType": coupon.coupon_type.as_deref().unwrap_or("PERCENTAGE_OFF"),
        "schedule": {
            "startDateTime": iso_timestamp("startDate", &coupon.start_date)?,
            "endDateTime": iso_timestamp("endDate", &coupon.end_date)?,
        },
        "promotion": {
            "promotionType": "PERCENTAGE_OFF",
            "discountValue": amount_or(&coupon.discount_value, DEFAULT_DISCOUNT),
            "budget": {
                "amount": amount_or(&coupon.total_budget, DEFAULT_BUDGET),
                "currencyCode": coupon.currency.as_deref().unwrap_or("EUR"),
            }
        },
        "eligibleSelections": [{"asin": coupon.asin}],
        "customerSegment": coupon.customer_type.as_deref().unwrap_or("ALL"),
    }))
}

/// Create a coupon. Sellers without Brand Registry get a `PENDING` result
/// instead of an error.
pub async fn create_coupon(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let CouponPayload { coupon } = parse_payload(payload)?;
    let body = coupon_body(&coupon)?;

    let request = SpApiRequest::new(Method::POST, ["coupons", "2022-03-01", "coupons"])
        .query("marketplaceId", &ctx.marketplace_id)
        .json(body);

    match ctx.call(request).await {
        Ok(response) => Ok(json!({
            "couponId": response.body.get("couponId").cloned().unwrap_or(Value::Null),
            "asin": coupon.asin,
            "marketplace": ctx.marketplace,
            "message": "Coupon created successfully",
        })),
        Err(e) if e.upstream_status() == Some(403) => {
            tracing::info!(asin = ?coupon.asin, "Coupons API not available for this seller");
            Ok(json!({
                "couponId": "PENDING",
                "asin": coupon.asin,
                "marketplace": ctx.marketplace,
                "message": "Coupons API requires Brand Registry. Please create via Seller Central.",
            }))
        }
        Err(e) => Err(e.context("Coupon creation failed")),
    }
}

#[derive(Debug, Deserialize)]
struct PromotionPayload {
    #[serde(default)]
    promotion: Map<String, Value>,
}

/// Promotions need Vendor Central access; returns a local identifier and
/// guidance without calling upstream.
pub async fn launch_promotion(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let PromotionPayload { promotion } = parse_payload(payload)?;
    Ok(json!({
        "promotionId": format!("PROMO-{}", Utc::now().timestamp_millis()),
        "asin": promotion.get("asin").cloned().unwrap_or(Value::Null),
        "marketplace": ctx.marketplace,
        "message": "Promotion creation requires Vendor Central access. Please use Seller Central Promotions page.",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::operations::testing::{self, payload};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_amount_fallbacks() {
        assert_eq!(amount_or(&json!(15), DEFAULT_DISCOUNT), 15.0);
        assert_eq!(amount_or(&json!("12.5"), DEFAULT_DISCOUNT), 12.5);
        assert_eq!(amount_or(&json!("abc"), DEFAULT_DISCOUNT), 10.0);
        assert_eq!(amount_or(&json!(0), DEFAULT_BUDGET), 1000.0);
        assert_eq!(amount_or(&Value::Null, DEFAULT_BUDGET), 1000.0);
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(iso_timestamp("d", "2024-05-01").unwrap(), "2024-05-01T00:00:00.000Z");
        assert_eq!(
            iso_timestamp("d", "2024-05-01T10:30:00+02:00").unwrap(),
            "2024-05-01T08:30:00.000Z"
        );
        let err = iso_timestamp("startDate", "next week").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    fn coupon_request() -> Map<String, Value> {
        payload(json!({"coupon": {
            "asin": "B01",
            "startDate": "2024-05-01",
            "endDate": "2024-05-31",
            "discountValue": "20",
            "currency": "GBP"
        }}))
    }

    #[tokio::test]
    async fn test_coupon_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/coupons/2022-03-01/coupons"))
            .and(body_partial_json(json!({
                "schedule": {"startDateTime": "2024-05-01T00:00:00.000Z"},
                "promotion": {"discountValue": 20.0, "budget": {"amount": 1000.0, "currencyCode": "GBP"}},
                "customerSegment": "ALL"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"couponId": "C-77"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = create_coupon(testing::context(&server.uri()), coupon_request())
            .await
            .unwrap();
        assert_eq!(result["couponId"], "C-77");
    }

    #[tokio::test]
    async fn test_coupon_forbidden_is_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let result = create_coupon(testing::context(&server.uri()), coupon_request())
            .await
            .unwrap();
        assert_eq!(result["couponId"], "PENDING");
        assert_eq!(result["asin"], "B01");
    }

    #[tokio::test]
    async fn test_coupon_other_failure_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{"message": "Invalid discount"}]
            })))
            .mount(&server)
            .await;

        let err = create_coupon(testing::context(&server.uri()), coupon_request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Coupon creation failed: Invalid discount");
    }

    #[tokio::test]
    async fn test_promotion_placeholder() {
        let result = launch_promotion(
            testing::context("http://127.0.0.1:9"),
            payload(json!({"promotion": {"asin": "B01"}})),
        )
        .await
        .unwrap();
        assert!(result["promotionId"].as_str().unwrap().starts_with("PROMO-"));
        assert_eq!(result["asin"], "B01");
    }
}
