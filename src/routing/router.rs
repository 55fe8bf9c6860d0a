//! Operation dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::{Credentials, LwaClient};
use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::lifecycle::startup::StartupError;
use crate::observability::metrics;
use crate::operations::{HandlerSettings, OperationContext};
use crate::routing::registry::{OperationKind, Registry};
use crate::spapi::SpApiClient;

/// One inbound invocation. Fields other than the four named ones form the
/// operation payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub marketplace: Option<String>,
    #[serde(default)]
    pub marketplace_id: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Validates, authenticates and dispatches operation requests.
pub struct OperationRouter {
    registry: Arc<Registry>,
    lwa: LwaClient,
    spapi: SpApiClient,
    settings: HandlerSettings,
}

impl OperationRouter {
    pub fn new(registry: Arc<Registry>, lwa: LwaClient, spapi: SpApiClient, settings: HandlerSettings) -> Self {
        Self {
            registry,
            lwa,
            spapi,
            settings,
        }
    }

    /// Build the router and its upstream clients from configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self, StartupError> {
        let registry = Arc::new(Registry::standard()?);
        let http = SpApiClient::build_http(config)?;
        let lwa = LwaClient::new(http.clone(), config.upstream.token_url.clone());
        let spapi = SpApiClient::from_config(http, config)?;
        let settings = HandlerSettings {
            inter_call_delay: Duration::from_millis(config.upstream.inter_call_delay_ms),
            import_page_size: config.upstream.import_page_size,
        };
        Ok(Self::new(registry, lwa, spapi, settings))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one invocation to completion and return the handler's result object.
    pub async fn dispatch(&self, request: OperationRequest) -> RelayResult<Map<String, Value>> {
        let start = Instant::now();
        let marketplace = request.marketplace.clone().unwrap_or_default();
        tracing::info!(
            operation = %request.operation,
            marketplace = %marketplace,
            "Operation received"
        );

        let label = OperationKind::from_name(&request.operation)
            .map(OperationKind::name)
            .unwrap_or("unknown");

        let result = self.run(request).await;
        match &result {
            Ok(_) => metrics::record_operation(label, "success", start),
            Err(e) => {
                tracing::error!(operation = label, kind = ?e.kind(), error = %e, "Operation failed");
                metrics::record_operation(label, "error", start);
            }
        }
        result
    }

    async fn run(&self, request: OperationRequest) -> RelayResult<Map<String, Value>> {
        let OperationRequest {
            operation,
            marketplace,
            marketplace_id,
            credentials,
            payload,
        } = request;

        let credentials = credentials
            .ok_or_else(|| RelayError::Configuration("Missing required credentials".to_string()))?
            .validate()?;

        let (kind, handler) = self
            .registry
            .lookup(&operation)
            .ok_or_else(|| RelayError::UnknownOperation(operation.clone()))?;

        let access_token = self.lwa.exchange(&credentials).await?;

        let ctx = Arc::new(OperationContext {
            marketplace: marketplace.unwrap_or_default(),
            marketplace_id: marketplace_id.unwrap_or_default(),
            seller_id: credentials.seller_id,
            access_token,
            spapi: self.spapi.clone(),
            settings: self.settings.clone(),
        });

        tracing::debug!(operation = %kind, "Dispatching to handler");
        let value = handler.handle(ctx, payload).await?;
        Ok(into_object(value))
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    }
}
