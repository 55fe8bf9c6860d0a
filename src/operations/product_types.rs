//! Product Type Definitions: live validation rules per product type.
//!
//! The definition response links to the JSON schema document
//! (`schema.link.resource`); rules are derived from that document's
//! `properties` and `required`. When anything fails the handler still
//! succeeds and answers with built-in default rules, marked by
//! `schemaStatus: "FALLBACK"`.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{RelayError, RelayResult};
use crate::operations::{parse_payload, OperationContext};
use crate::spapi::marketplace::locale_for;
use crate::spapi::SpApiRequest;

const DEFAULT_REQUIREMENTS: &str = "LISTING";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaPayload {
    product_type: Option<String>,
    requirements: Option<String>,
}

/// Validation rules derived from a product type schema.
#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    pub product_type: String,
    pub required_fields: Vec<String>,
    pub optional_fields: Vec<String>,
    pub field_validations: Map<String, Value>,
    pub max_lengths: Map<String, Value>,
    pub enums: Map<String, Value>,
    pub patterns: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRules {
    /// Rules used when the live schema is unavailable.
    pub fn defaults(product_type: &str) -> Self {
        let mut max_lengths = Map::new();
        for (field, limit) in [
            ("item_name", 200),
            ("bullet_point", 500),
            ("product_description", 2000),
            ("generic_keywords", 250),
        ] {
            max_lengths.insert(field.to_string(), json!(limit));
        }

        Self {
            product_type: product_type.to_string(),
            required_fields: ["item_name", "brand", "product_description"]
                .map(str::to_string)
                .to_vec(),
            max_lengths,
            message: Some("Using default validation rules - schema fetch failed".to_string()),
            ..Default::default()
        }
    }

    /// Walk a JSON schema's top-level properties.
    ///
    /// A schema without `properties` yields empty rules.
    pub fn from_schema(schema: &Value, product_type: &str) -> Self {
        let mut rules = Self {
            product_type: product_type.to_string(),
            ..Default::default()
        };

        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            tracing::warn!(product_type, "Schema has no properties, returning empty rules");
            return rules;
        };
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        for (name, definition) in properties {
            if required.contains(&name.as_str()) {
                rules.required_fields.push(name.clone());
            } else {
                rules.optional_fields.push(name.clone());
            }

            let mut validation = Map::new();
            if let Some(max) = definition.get("maxLength") {
                rules.max_lengths.insert(name.clone(), max.clone());
                validation.insert("maxLength".to_string(), max.clone());
            }
            if let Some(min) = definition.get("minLength") {
                validation.insert("minLength".to_string(), min.clone());
            }
            if let Some(pattern) = definition.get("pattern") {
                rules.patterns.insert(name.clone(), pattern.clone());
                validation.insert("pattern".to_string(), pattern.clone());
            }
            if let Some(values) = definition.get("enum") {
                rules.enums.insert(name.clone(), values.clone());
                validation.insert("enum".to_string(), values.clone());
            }
            for key in ["type", "description"] {
                if let Some(value) = definition.get(key) {
                    validation.insert(key.to_string(), value.clone());
                }
            }
            rules.field_validations.insert(name.clone(), Value::Object(validation));
        }
        rules
    }
}

/// Fetch the definition and, when linked, the schema document it points at.
async fn fetch_definition(
    ctx: &OperationContext,
    product_type: &str,
    requirements: &str,
) -> RelayResult<(Value, ValidationRules)> {
    let request = SpApiRequest::new(Method::GET, ["definitions", "2020-09-01", "productTypes", product_type])
        .query("marketplaceIds", &ctx.marketplace_id)
        .query("requirements", requirements)
        .query("locale", locale_for(&ctx.marketplace));
    let definition = ctx.call(request).await?.body;

    let rules = match definition.pointer("/schema/link/resource").and_then(Value::as_str) {
        Some(location) => {
            let document = ctx.spapi.fetch_document(location).await?;
            ValidationRules::from_schema(&document, product_type)
        }
        None => {
            let inline = definition.get("schema").unwrap_or(&Value::Null);
            ValidationRules::from_schema(inline, product_type)
        }
    };
    Ok((definition, rules))
}

pub async fn get_product_schema(ctx: Arc<OperationContext>, payload: Map<String, Value>) -> RelayResult<Value> {
    let SchemaPayload {
        product_type,
        requirements,
    } = parse_payload(payload)?;
    let product_type = product_type
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| RelayError::InvalidRequest("productType is required".to_string()))?;
    let requirements = requirements.as_deref().unwrap_or(DEFAULT_REQUIREMENTS);

    tracing::info!(product_type = %product_type, marketplace = %ctx.marketplace, "Fetching product type schema");

    match fetch_definition(&ctx, &product_type, requirements).await {
        Ok((schema, rules)) => Ok(json!({
            "productType": product_type,
            "marketplace": ctx.marketplace,
            "schema": schema,
            "validationRules": rules,
            "message": format!("Schema fetched successfully for {}", product_type),
        })),
        Err(e) => {
            tracing::warn!(product_type = %product_type, error = %e, "Schema fetch failed, using defaults");
            Ok(json!({
                "schemaStatus": "FALLBACK",
                "productType": product_type,
                "marketplace": ctx.marketplace,
                "error": e.to_string(),
                "message": "Using default validation rules",
                "validationRules": ValidationRules::defaults(&product_type),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::testing::{self, payload};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn schema_document() -> Value {
        json!({
            "properties": {
                "item_name": {"type": "array", "maxLength": 200, "description": "Title"},
                "color": {"type": "string", "enum": ["red", "blue"]},
                "gtin": {"type": "string", "pattern": "^[0-9]{13}$", "minLength": 13}
            },
            "required": ["item_name"]
        })
    }

    #[test]
    fn test_rules_from_schema() {
        let rules = ValidationRules::from_schema(&schema_document(), "MUG");

        assert_eq!(rules.required_fields, vec!["item_name"]);
        assert_eq!(rules.optional_fields, vec!["color", "gtin"]);
        assert_eq!(rules.max_lengths["item_name"], 200);
        assert_eq!(rules.enums["color"], json!(["red", "blue"]));
        assert_eq!(rules.patterns["gtin"], "^[0-9]{13}$");
        assert_eq!(
            rules.field_validations["gtin"],
            json!({"type": "string", "pattern": "^[0-9]{13}$", "minLength": 13})
        );
    }

    #[test]
    fn test_schema_without_properties() {
        let rules = ValidationRules::from_schema(&json!({"title": "x"}), "MUG");
        assert!(rules.required_fields.is_empty());
        assert!(rules.field_validations.is_empty());
    }

    #[tokio::test]
    async fn test_linked_schema_document_is_followed() {
        let server = MockServer::start().await;
        let link = format!("{}/schemas/mug.json", server.uri());
        Mock::given(method("GET"))
            .and(path("/definitions/2020-09-01/productTypes/MUG"))
            .and(query_param("requirements", "LISTING"))
            .and(query_param("locale", "de_DE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "productType": "MUG",
                "schema": {"link": {"resource": link, "verb": "GET"}, "checksum": "abc"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/schemas/mug.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(schema_document()))
            .expect(1)
            .mount(&server)
            .await;

        let result = get_product_schema(testing::context(&server.uri()), payload(json!({"productType": "MUG"})))
            .await
            .unwrap();

        assert_eq!(result["validationRules"]["requiredFields"], json!(["item_name"]));
        assert_eq!(result["schema"]["schema"]["checksum"], "abc");
        assert_eq!(result["message"], "Schema fetched successfully for MUG");
        assert!(result.get("schemaStatus").is_none());
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errors": [{"message": "Product type not found"}]
            })))
            .mount(&server)
            .await;

        let result = get_product_schema(
            testing::context(&server.uri()),
            payload(json!({"productType": "NOPE"})),
        )
        .await
        .unwrap();

        assert_eq!(result["schemaStatus"], "FALLBACK");
        assert_eq!(result["error"], "Product type not found");
        assert_eq!(result["validationRules"]["maxLengths"]["item_name"], 200);
        assert_eq!(
            result["validationRules"]["requiredFields"],
            json!(["item_name", "brand", "product_description"])
        );
    }
}
