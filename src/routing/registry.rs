//! Operation registry.
//!
//! Maps each declared [`OperationKind`] to exactly one handler. Built and
//! validated once at startup.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::RelayResult;
use crate::operations::{self, OperationContext};

/// Every operation the relay accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Update,
    Create,
    Delete,
    ImportProducts,
    UploadImages,
    UploadVideos,
    PublishAplus,
    CreateCoupon,
    LaunchPromotion,
    GetProductSchema,
    Translate,
    ExportGpsr,
    ExportDocuments,
    ExportCustomization,
    ExportBrandStrip,
    ExportBrandStore,
    ExportVideos,
}

impl OperationKind {
    pub const ALL: [OperationKind; 17] = [
        OperationKind::Update,
        OperationKind::Create,
        OperationKind::Delete,
        OperationKind::ImportProducts,
        OperationKind::UploadImages,
        OperationKind::UploadVideos,
        OperationKind::PublishAplus,
        OperationKind::CreateCoupon,
        OperationKind::LaunchPromotion,
        OperationKind::GetProductSchema,
        OperationKind::Translate,
        OperationKind::ExportGpsr,
        OperationKind::ExportDocuments,
        OperationKind::ExportCustomization,
        OperationKind::ExportBrandStrip,
        OperationKind::ExportBrandStore,
        OperationKind::ExportVideos,
    ];

    /// Wire name used in the `operation` field.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Update => "update",
            OperationKind::Create => "create",
            OperationKind::Delete => "delete",
            OperationKind::ImportProducts => "import_products",
            OperationKind::UploadImages => "upload_images",
            OperationKind::UploadVideos => "upload_videos",
            OperationKind::PublishAplus => "publish_aplus",
            OperationKind::CreateCoupon => "create_coupon",
            OperationKind::LaunchPromotion => "launch_promotion",
            OperationKind::GetProductSchema => "get_product_schema",
            OperationKind::Translate => "translate",
            OperationKind::ExportGpsr => "exportGpsr",
            OperationKind::ExportDocuments => "exportDocuments",
            OperationKind::ExportCustomization => "exportCustomization",
            OperationKind::ExportBrandStrip => "exportBrandStrip",
            OperationKind::ExportBrandStore => "exportBrandStore",
            OperationKind::ExportVideos => "exportVideos",
        }
    }

    /// Exact, case-sensitive lookup by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub type HandlerFuture = BoxFuture<'static, RelayResult<Value>>;

/// A typed handler capability for one operation.
pub trait OperationHandler: Send + Sync {
    fn handle(&self, ctx: Arc<OperationContext>, payload: Map<String, Value>) -> HandlerFuture;
}

impl<F, Fut> OperationHandler for F
where
    F: Fn(Arc<OperationContext>, Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = RelayResult<Value>> + Send + 'static,
{
    fn handle(&self, ctx: Arc<OperationContext>, payload: Map<String, Value>) -> HandlerFuture {
        Box::pin(self(ctx, payload))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("operation '{0}' registered twice")]
    Duplicate(&'static str),

    #[error("operation name '{0}' declared by more than one kind")]
    DuplicateName(&'static str),

    #[error("no handler registered for: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Mapping from operation kind to handler.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<OperationKind, Arc<dyn OperationHandler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler, validated.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        operations::register_all(&mut registry)?;
        registry.validate()?;
        tracing::debug!(operations = registry.len(), "Operation registry ready");
        Ok(registry)
    }

    pub fn register<H>(&mut self, kind: OperationKind, handler: H) -> Result<(), RegistryError>
    where
        H: OperationHandler + 'static,
    {
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::Duplicate(kind.name()));
        }
        self.handlers.insert(kind, Arc::new(handler));
        Ok(())
    }

    /// Every declared kind has a handler and every wire name is unique.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for kind in OperationKind::ALL {
            if !seen.insert(kind.name()) {
                return Err(RegistryError::DuplicateName(kind.name()));
            }
        }

        let missing: Vec<&'static str> = OperationKind::ALL
            .iter()
            .filter(|kind| !self.handlers.contains_key(kind))
            .map(|kind| kind.name())
            .collect();
        if !missing.is_empty() {
            return Err(RegistryError::Missing(missing));
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<(OperationKind, Arc<dyn OperationHandler>)> {
        let kind = OperationKind::from_name(name)?;
        self.handlers.get(&kind).map(|handler| (kind, handler.clone()))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_ctx: Arc<OperationContext>, _payload: Map<String, Value>) -> RelayResult<Value> {
        Ok(Value::Null)
    }

    #[test]
    fn test_standard_registry_covers_every_kind() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.len(), OperationKind::ALL.len());
        for kind in OperationKind::ALL {
            let (found, _) = registry.lookup(kind.name()).unwrap();
            assert_eq!(found, kind);
        }
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = Registry::standard().unwrap();
        assert!(registry.lookup("exportGpsr").is_some());
        assert!(registry.lookup("exportgpsr").is_none());
        assert!(registry.lookup("update ").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry.register(OperationKind::Delete, noop).unwrap();
        assert_eq!(
            registry.register(OperationKind::Delete, noop).unwrap_err(),
            RegistryError::Duplicate("delete")
        );
    }

    #[test]
    fn test_incomplete_registry_rejected() {
        let mut registry = Registry::new();
        for kind in OperationKind::ALL {
            if kind != OperationKind::Translate && kind != OperationKind::ExportVideos {
                registry.register(kind, noop).unwrap();
            }
        }
        match registry.validate() {
            Err(RegistryError::Missing(names)) => assert_eq!(names, vec!["translate", "exportVideos"]),
            other => panic!("expected missing handlers, got {:?}", other.err()),
        }
    }
}
