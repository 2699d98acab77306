//! Top-level orchestration: registration, resolution and per-module export

use crate::container::{DependencyContainer, DependencyInfo, ValidationReport};
use crate::document::ExportedDocument;
use crate::error::Result;
use crate::provider::{FactoryProvider, Injectable, InstanceProvider};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Type name the network module is registered under
pub const NETWORK_TYPE: &str = "NetworkInfrastructure";
/// Type name the compute module is registered under
pub const COMPUTE_TYPE: &str = "ComputeResources";
/// Type name the identity module is registered under
pub const IDENTITY_TYPE: &str = "IdentityResources";
/// Type name the cluster module is registered under
pub const CLUSTER_TYPE: &str = "KubernetesCluster";

/// Drives the whole build: registers module providers, resolves them in
/// dependency order and collects each module's exported resources.
pub struct Orchestrator {
    name: String,
    id: String,
    container: DependencyContainer,
    resolved: FxHashMap<String, Arc<dyn Injectable>>,
    created_at: DateTime<Utc>,
}

impl Orchestrator {
    /// Create an orchestrator with its own container
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let container = DependencyContainer::new(format!("{name}-container"));
        Self {
            name,
            id: format!("orc-{}", &Uuid::new_v4().simple().to_string()[..8]),
            container,
            resolved: FxHashMap::default(),
            created_at: Utc::now(),
        }
    }

    /// The orchestrator's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the underlying container
    pub fn container(&self) -> &DependencyContainer {
        &self.container
    }

    /// Mutably borrow the underlying container
    pub fn container_mut(&mut self) -> &mut DependencyContainer {
        &mut self.container
    }

    /// Register an already built module under `type_name`
    pub fn register_module(
        &mut self,
        type_name: &str,
        module: Arc<dyn Injectable>,
        depends_on: Vec<String>,
    ) -> &mut Self {
        self.container
            .register(Arc::new(InstanceProvider::new(type_name, module)), depends_on);
        self
    }

    /// Register a factory that builds the module on first resolution
    pub fn register_factory<F>(
        &mut self,
        type_name: &str,
        factory: F,
        depends_on: Vec<String>,
    ) -> &mut Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn Injectable>> + Send + Sync + 'static,
    {
        self.container
            .register(Arc::new(FactoryProvider::new(type_name, factory)), depends_on);
        self
    }

    /// Register the network module; it depends on nothing by default
    pub fn register_network(&mut self, module: Arc<dyn Injectable>) -> &mut Self {
        self.register_module(NETWORK_TYPE, module, Vec::new())
    }

    /// Register the compute module.
    ///
    /// Defaults to depending on the network module unless told otherwise.
    pub fn register_compute(
        &mut self,
        module: Arc<dyn Injectable>,
        depends_on: Option<Vec<String>>,
    ) -> &mut Self {
        let depends_on = depends_on.unwrap_or_else(|| vec![NETWORK_TYPE.to_string()]);
        self.register_module(COMPUTE_TYPE, module, depends_on)
    }

    /// Register the identity module.
    ///
    /// Defaults to depending on the network module unless told otherwise.
    pub fn register_identity(
        &mut self,
        module: Arc<dyn Injectable>,
        depends_on: Option<Vec<String>>,
    ) -> &mut Self {
        let depends_on = depends_on.unwrap_or_else(|| vec![NETWORK_TYPE.to_string()]);
        self.register_module(IDENTITY_TYPE, module, depends_on)
    }

    /// Register the cluster module.
    ///
    /// Defaults to depending on the network module unless told otherwise.
    pub fn register_cluster(
        &mut self,
        module: Arc<dyn Injectable>,
        depends_on: Option<Vec<String>>,
    ) -> &mut Self {
        let depends_on = depends_on.unwrap_or_else(|| vec![NETWORK_TYPE.to_string()]);
        self.register_module(CLUSTER_TYPE, module, depends_on)
    }

    /// Resolve every module and export each one in resolution order.
    ///
    /// A failing export is captured in the result keyed by type name; one
    /// bad module never hides the others. Structural problems in the graph
    /// (unregistered types, cycles) still propagate as errors.
    pub fn orchestrate(&mut self) -> Result<OrchestrationResult> {
        let order = self.container.resolution_order()?;
        let resolved = self.container.resolve_all()?;

        let mut modules = BTreeMap::new();
        for type_name in &order {
            let Some(module) = resolved.get(type_name) else {
                continue;
            };
            let outcome = match module.export() {
                Ok(document) => ModuleExport::Document(document),
                Err(error) => {
                    warn!("export failed for '{type_name}': {error}");
                    ModuleExport::Failed {
                        error: error.to_string(),
                    }
                }
            };
            modules.insert(type_name.clone(), outcome);
        }

        self.resolved = resolved;
        info!(
            "orchestrated {} modules ({} export failures)",
            self.resolved.len(),
            modules.values().filter(|m| m.is_failed()).count()
        );

        Ok(OrchestrationResult {
            orchestrator: OrchestratorInfo {
                name: self.name.clone(),
                id: self.id.clone(),
                created_at: self.created_at.to_rfc3339(),
            },
            dependency_info: self.container.dependency_info(),
            modules,
            total_modules: self.resolved.len(),
        })
    }

    /// Already-resolved module for `type_name`, if any.
    ///
    /// Soft accessor: absent before `orchestrate` has run or for unknown
    /// names, never an error.
    pub fn component(&self, type_name: &str) -> Option<Arc<dyn Injectable>> {
        self.resolved.get(type_name).cloned()
    }

    /// Validate the wiring without resolving anything
    pub fn validate(&self) -> ValidationReport {
        self.container.validate()
    }
}

/// Identity of the orchestrator that produced a result
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorInfo {
    /// Orchestrator name
    pub name: String,
    /// Generated orchestrator id
    pub id: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// Outcome of a single module's export during orchestration
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ModuleExport {
    /// The module exported cleanly
    Document(ExportedDocument),
    /// The export failed; siblings were not affected
    Failed {
        /// The captured failure message
        error: String,
    },
}

impl ModuleExport {
    /// The exported document, if the export succeeded
    pub fn document(&self) -> Option<&ExportedDocument> {
        match self {
            ModuleExport::Document(document) => Some(document),
            ModuleExport::Failed { .. } => None,
        }
    }

    /// Whether the export failed
    pub fn is_failed(&self) -> bool {
        matches!(self, ModuleExport::Failed { .. })
    }
}

/// Everything one orchestration pass produces
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationResult {
    /// Which orchestrator ran
    pub orchestrator: OrchestratorInfo,
    /// Diagnostic snapshot of the container wiring
    pub dependency_info: DependencyInfo,
    /// Export outcome per type name
    pub modules: BTreeMap<String, ModuleExport>,
    /// Number of resolved modules, independent of export failures
    pub total_modules: usize,
}

impl OrchestrationResult {
    /// Merge the successful exports into one document, resolution order first
    pub fn merged_document(&self) -> ExportedDocument {
        ExportedDocument::merge(
            self.dependency_info
                .resolution_order
                .iter()
                .filter_map(|name| self.modules.get(name))
                .filter_map(ModuleExport::document)
                .cloned(),
        )
    }

    /// Type names whose export failed, with the captured messages
    pub fn export_failures(&self) -> Vec<(&str, &str)> {
        self.modules
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                ModuleExport::Failed { error } => Some((name.as_str(), error.as_str())),
                ModuleExport::Document(_) => None,
            })
            .collect()
    }
}
