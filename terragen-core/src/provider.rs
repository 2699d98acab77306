//! Module providers and the injectable contract

use crate::document::ExportedDocument;
use crate::error::{ContainerError, Result};
use std::sync::Arc;

/// A module instance the container can hand out.
///
/// Every module kind exposes the same export surface, so the orchestrator
/// never has to probe for richer capabilities.
pub trait Injectable: Send + Sync {
    /// Flatten the module into a single exportable document.
    fn export(&self) -> anyhow::Result<ExportedDocument>;

    /// Names of the resources this module depends on.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Factory closure that produces a module instance on demand
pub type ModuleFactory = Box<dyn Fn() -> anyhow::Result<Arc<dyn Injectable>> + Send + Sync>;

/// A named binding between a type name and a source of module instances
pub trait Provider: Send + Sync {
    /// The type name this provider is registered under
    fn type_name(&self) -> &str;

    /// Produce (or hand out) the module instance
    fn provide(&self) -> Result<Arc<dyn Injectable>>;
}

/// Provider over a module that was built before registration.
///
/// This is the common case: the network stack, identity bundle and cluster
/// are assembled by their builders first and then bound into the container.
pub struct InstanceProvider {
    type_name: String,
    instance: Arc<dyn Injectable>,
}

impl InstanceProvider {
    /// Wrap an existing module instance under `type_name`
    pub fn new(type_name: impl Into<String>, instance: Arc<dyn Injectable>) -> Self {
        Self {
            type_name: type_name.into(),
            instance,
        }
    }
}

impl Provider for InstanceProvider {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn provide(&self) -> Result<Arc<dyn Injectable>> {
        Ok(Arc::clone(&self.instance))
    }
}

/// Provider that defers construction to a factory closure
pub struct FactoryProvider {
    type_name: String,
    factory: ModuleFactory,
}

impl FactoryProvider {
    /// Register `factory` as the source of instances for `type_name`
    pub fn new<F>(type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn Injectable>> + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            factory: Box::new(factory),
        }
    }
}

impl Provider for FactoryProvider {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn provide(&self) -> Result<Arc<dyn Injectable>> {
        (self.factory)().map_err(|e| ContainerError::ProviderFailed {
            type_name: self.type_name.clone(),
            reason: e.to_string(),
        })
    }
}
