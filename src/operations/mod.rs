//! Operation handlers.
//!
//! One async function per operation. Each receives the shared invocation
//! context and the request payload (every top-level field the router did not
//! consume) and returns the result object merged into the success envelope.
//!
//! Handlers never emit a top-level `status` key; the envelope owns it.

pub mod aplus;
pub mod batch;
pub mod brand;
pub mod compliance;
pub mod images;
pub mod listings;
pub mod product_types;
pub mod promotions;
pub mod translate;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::auth::AccessToken;
use crate::error::RelayResult;
use crate::routing::registry::{OperationKind, Registry, RegistryError};
use crate::spapi::{SpApiClient, SpApiRequest, SpApiResponse};

/// Tunables handed to every handler.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Pause between consecutive per-language listing calls.
    pub inter_call_delay: Duration,
    pub import_page_size: u32,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            inter_call_delay: Duration::from_millis(200),
            import_page_size: 20,
        }
    }
}

/// Everything a handler needs about the current invocation.
#[derive(Debug)]
pub struct OperationContext {
    /// Marketplace code as sent by the caller (`DE`, `US`, ...).
    pub marketplace: String,
    pub marketplace_id: String,
    pub seller_id: String,
    pub access_token: AccessToken,
    pub spapi: SpApiClient,
    pub settings: HandlerSettings,
}

impl OperationContext {
    /// Call SP-API for this invocation's marketplace with its access token.
    pub async fn call(&self, request: SpApiRequest) -> RelayResult<SpApiResponse> {
        self.spapi
            .call(&self.access_token, &self.marketplace, &request)
            .await
    }
}

/// Decode the operation payload into its typed form.
pub fn parse_payload<T: DeserializeOwned>(payload: Map<String, Value>) -> RelayResult<T> {
    Ok(serde_json::from_value(Value::Object(payload))?)
}

/// Register every built-in handler.
pub fn register_all(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(OperationKind::Update, listings::update)?;
    registry.register(OperationKind::Create, listings::update)?;
    registry.register(OperationKind::Delete, listings::delete)?;
    registry.register(OperationKind::ImportProducts, listings::import_products)?;
    registry.register(OperationKind::UploadImages, images::upload_images)?;
    registry.register(OperationKind::UploadVideos, images::upload_videos)?;
    registry.register(OperationKind::PublishAplus, aplus::publish)?;
    registry.register(OperationKind::CreateCoupon, promotions::create_coupon)?;
    registry.register(OperationKind::LaunchPromotion, promotions::launch_promotion)?;
    registry.register(OperationKind::GetProductSchema, product_types::get_product_schema)?;
    registry.register(OperationKind::Translate, translate::translate)?;
    registry.register(OperationKind::ExportGpsr, compliance::export_gpsr)?;
    registry.register(OperationKind::ExportDocuments, compliance::export_documents)?;
    registry.register(OperationKind::ExportCustomization, compliance::export_customization)?;
    registry.register(OperationKind::ExportBrandStrip, brand::export_brand_strip)?;
    registry.register(OperationKind::ExportBrandStore, brand::export_brand_store)?;
    registry.register(OperationKind::ExportVideos, compliance::export_videos)?;
    Ok(())
}

/// Attribute value localized to one language of one marketplace.
pub(crate) fn localized(value: impl Into<Value>, language: &str, marketplace_id: &str) -> Value {
    serde_json::json!({
        "value": value.into(),
        "language_tag": language,
        "marketplace_id": marketplace_id,
    })
}
