//! Module container: registration, ordering and memoized resolution

use crate::error::{ContainerError, Result};
use crate::graph::DependencyGraph;
use crate::provider::{Injectable, Provider};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Registers typed providers with their declared dependencies, computes a
/// resolution order, memoizes each resolved module and detects cycles.
///
/// Re-registering a provider under an already bound type name replaces the
/// previous binding (last-write-wins). The replacement is deliberate and
/// logged, not silently ignored.
pub struct DependencyContainer {
    name: String,
    id: String,
    providers: FxHashMap<String, Arc<dyn Provider>>,
    singletons: FxHashMap<String, Arc<dyn Injectable>>,
    graph: DependencyGraph,
    order: Vec<String>,
    created_at: DateTime<Utc>,
}

impl DependencyContainer {
    /// Create an empty container
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: format!("dic-{}", short_id()),
            providers: FxHashMap::default(),
            singletons: FxHashMap::default(),
            graph: DependencyGraph::new(),
            order: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The container's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The container's generated id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The current dependency graph
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Whether a provider is bound under `type_name`
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.providers.contains_key(type_name)
    }

    /// Whether an instance is cached under `type_name`
    pub fn has_singleton(&self, type_name: &str) -> bool {
        self.singletons.contains_key(type_name)
    }

    /// Register a provider together with the type names it depends on.
    ///
    /// Replaces any provider already bound to the same type name. Never
    /// fails: a cycle introduced here surfaces from [`resolution_order`]
    /// or the resolve calls, before anything gets instantiated.
    ///
    /// [`resolution_order`]: DependencyContainer::resolution_order
    pub fn register(
        &mut self,
        provider: Arc<dyn Provider>,
        dependencies: Vec<String>,
    ) -> &mut Self {
        let type_name = provider.type_name().to_string();
        if self.providers.insert(type_name.clone(), provider).is_some() {
            debug!("replacing provider registration for '{type_name}'");
        }
        self.graph.set_dependencies(type_name.clone(), dependencies);

        // Refresh the cached order while the graph stays acyclic; a cycle
        // is reported when the caller next asks for an order or resolves.
        match self.graph.topological_sort() {
            Ok(order) => self.order = order,
            Err(_) => self.order.clear(),
        }

        trace!(
            "registered '{type_name}' ({} providers total)",
            self.providers.len()
        );
        self
    }

    /// Seed the cache with an externally constructed module.
    ///
    /// A seeded singleton wins over any provider bound to the same type
    /// name and is returned as-is by every subsequent resolve.
    pub fn register_singleton(
        &mut self,
        type_name: impl Into<String>,
        instance: Arc<dyn Injectable>,
    ) -> &mut Self {
        let type_name = type_name.into();
        debug!("seeding singleton '{type_name}'");
        self.singletons.insert(type_name, instance);
        self
    }

    /// Resolve a type name, building its dependency chain first.
    ///
    /// A cached instance is returned as-is. Otherwise the graph is checked
    /// for cycles, every declared dependency is resolved depth-first with
    /// memoization, and the provider is asked for an instance exactly once.
    pub fn resolve(&mut self, type_name: &str) -> Result<Arc<dyn Injectable>> {
        if let Some(instance) = self.singletons.get(type_name) {
            return Ok(Arc::clone(instance));
        }
        // Fail fast on a cyclic graph before instantiating anything.
        self.graph.topological_sort()?;
        self.resolve_inner(type_name)
    }

    fn resolve_inner(&mut self, type_name: &str) -> Result<Arc<dyn Injectable>> {
        if let Some(instance) = self.singletons.get(type_name) {
            return Ok(Arc::clone(instance));
        }

        let provider = self.providers.get(type_name).cloned().ok_or_else(|| {
            ContainerError::UnregisteredType {
                type_name: type_name.to_string(),
            }
        })?;

        let dependencies = self.graph.dependencies_of(type_name).to_vec();
        for dependency in &dependencies {
            if !self.singletons.contains_key(dependency) {
                self.resolve_inner(dependency)?;
            }
        }

        let instance = provider.provide()?;
        self.singletons
            .insert(type_name.to_string(), Arc::clone(&instance));
        debug!("resolved '{type_name}'");
        Ok(instance)
    }

    /// Resolve every registered type in resolution order
    pub fn resolve_all(&mut self) -> Result<FxHashMap<String, Arc<dyn Injectable>>> {
        let order = self.resolution_order()?;
        let mut resolved = FxHashMap::default();
        for type_name in &order {
            resolved.insert(type_name.clone(), self.resolve_inner(type_name)?);
        }
        Ok(resolved)
    }

    /// Compute the resolution order for the current graph.
    ///
    /// Idempotent for an unchanged graph. Fails with the full offending
    /// chain when the graph is cyclic; a partial order is never returned.
    pub fn resolution_order(&self) -> Result<Vec<String>> {
        self.graph.topological_sort()
    }

    /// Validate the wiring without resolving anything.
    ///
    /// Reports every unsatisfied dependency, not just the first one, plus
    /// any cycle in the graph. Pure: no state is mutated.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            analysis: BTreeMap::new(),
        };

        if let Err(err) = self.graph.topological_sort() {
            report.is_valid = false;
            report.errors.push(err.to_string());
        }

        for type_name in self.graph.nodes() {
            let mut analysis = TypeAnalysis {
                has_provider: self.providers.contains_key(&type_name),
                dependencies: Vec::new(),
            };

            for dependency in self.graph.dependencies_of(&type_name) {
                let satisfied = self.providers.contains_key(dependency)
                    || self.singletons.contains_key(dependency);
                if !satisfied {
                    report.is_valid = false;
                    report.errors.push(format!(
                        "dependency '{dependency}' of '{type_name}' is not registered"
                    ));
                }
                analysis.dependencies.push(DependencyStatus {
                    dependency: dependency.clone(),
                    satisfied,
                });
            }

            report.analysis.insert(type_name, analysis);
        }

        report
    }

    /// Pure diagnostic snapshot of the container's wiring
    pub fn dependency_info(&self) -> DependencyInfo {
        let mut registered_types: Vec<_> = self.providers.keys().cloned().collect();
        registered_types.sort();
        let mut singletons: Vec<_> = self.singletons.keys().cloned().collect();
        singletons.sort();

        DependencyInfo {
            container_name: self.name.clone(),
            container_id: self.id.clone(),
            created_at: self.created_at.to_rfc3339(),
            registered_types,
            singletons,
            dependency_graph: self
                .graph
                .iter()
                .map(|(node, deps)| (node.clone(), deps.clone()))
                .collect(),
            resolution_order: self.order.clone(),
            total_providers: self.providers.len(),
            total_singletons: self.singletons.len(),
        }
    }
}

fn short_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Diagnostic snapshot of a container's wiring
#[derive(Debug, Clone, Serialize)]
pub struct DependencyInfo {
    /// Name of the container
    pub container_name: String,
    /// Generated container id
    pub container_id: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// Sorted type names with providers
    pub registered_types: Vec<String>,
    /// Sorted type names with cached instances
    pub singletons: Vec<String>,
    /// The full dependency graph
    pub dependency_graph: BTreeMap<String, Vec<String>>,
    /// The last successfully computed resolution order (empty on a cycle)
    pub resolution_order: Vec<String>,
    /// Number of registered providers
    pub total_providers: usize,
    /// Number of cached singletons
    pub total_singletons: usize,
}

/// Result of a pure wiring validation pass
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Whether every dependency is satisfied and the graph is acyclic
    pub is_valid: bool,
    /// All problems found, not just the first
    pub errors: Vec<String>,
    /// Non-fatal observations
    pub warnings: Vec<String>,
    /// Per-type satisfaction detail, keyed by type name
    pub analysis: BTreeMap<String, TypeAnalysis>,
}

/// Dependency satisfaction detail for one registered type
#[derive(Debug, Clone, Serialize)]
pub struct TypeAnalysis {
    /// Whether the type itself has a provider
    pub has_provider: bool,
    /// Status of each declared dependency, in declaration order
    pub dependencies: Vec<DependencyStatus>,
}

/// Whether a single declared dependency can be satisfied
#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    /// The dependency's type name
    pub dependency: String,
    /// True when a provider or singleton exists for it
    pub satisfied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ExportedDocument;
    use crate::provider::{FactoryProvider, InstanceProvider};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubModule {
        label: &'static str,
    }

    impl Injectable for StubModule {
        fn export(&self) -> anyhow::Result<ExportedDocument> {
            Ok(ExportedDocument::from_resources(vec![
                json!({ "label": self.label }),
            ]))
        }
    }

    fn stub(label: &'static str) -> Arc<dyn Injectable> {
        Arc::new(StubModule { label })
    }

    fn provider(type_name: &str, label: &'static str) -> Arc<dyn Provider> {
        Arc::new(InstanceProvider::new(type_name, stub(label)))
    }

    #[test]
    fn test_resolve_unregistered_type_fails() {
        let mut container = DependencyContainer::new("empty");
        match container.resolve("Unregistered") {
            Err(ContainerError::UnregisteredType { type_name }) => {
                assert_eq!(type_name, "Unregistered");
            }
            other => panic!("expected UnregisteredType, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_resolve_caches_a_single_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut container = DependencyContainer::new("cache");
        container.register(
            Arc::new(FactoryProvider::new("Network", move || {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(stub("network"))
            })),
            vec![],
        );

        let first = container.resolve("Network").unwrap();
        let second = container.resolve("Network").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_dependencies_resolve_before_dependents() {
        let mut container = DependencyContainer::new("chain");
        container.register(provider("Network", "network"), vec![]);
        container.register(
            provider("Compute", "compute"),
            vec!["Network".to_string()],
        );

        container.resolve("Compute").unwrap();
        assert!(container.has_singleton("Network"));
    }

    #[test]
    fn test_missing_dependency_fails_at_resolve_time() {
        let mut container = DependencyContainer::new("missing");
        container.register(provider("Compute", "compute"), vec!["Network".to_string()]);

        // Ordering tolerates the unknown name; resolution does not.
        assert_eq!(container.resolution_order().unwrap(), vec!["Compute"]);
        assert!(matches!(
            container.resolve("Compute"),
            Err(ContainerError::UnregisteredType { type_name }) if type_name == "Network"
        ));
    }

    #[test]
    fn test_seeded_singleton_satisfies_a_dependency() {
        let mut container = DependencyContainer::new("seeded");
        container.register_singleton("Network", stub("prebuilt"));
        container.register(provider("Compute", "compute"), vec!["Network".to_string()]);

        container.resolve("Compute").unwrap();
    }

    #[test]
    fn test_singleton_wins_over_provider() {
        let mut container = DependencyContainer::new("precedence");
        let seeded = stub("seeded");
        container.register(provider("Network", "from-provider"), vec![]);
        container.register_singleton("Network", Arc::clone(&seeded));

        let resolved = container.resolve("Network").unwrap();
        assert!(Arc::ptr_eq(&resolved, &seeded));
    }

    #[test]
    fn test_reregistration_is_last_write_wins() {
        let mut container = DependencyContainer::new("overwrite");
        container.register(provider("Network", "first"), vec![]);
        container.register(provider("Network", "second"), vec![]);

        let resolved = container.resolve("Network").unwrap();
        let document = resolved.export().unwrap();
        assert_eq!(document.resources[0]["label"], "second");
    }

    #[test]
    fn test_cycle_is_rejected_before_instantiation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut container = DependencyContainer::new("cyclic");
        container.register(
            Arc::new(FactoryProvider::new("A", move || {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(stub("a"))
            })),
            vec!["B".to_string()],
        );
        container.register(provider("B", "b"), vec!["A".to_string()]);

        assert!(matches!(
            container.resolve("A"),
            Err(ContainerError::CircularDependency { .. })
        ));
        assert!(matches!(
            container.resolve_all(),
            Err(ContainerError::CircularDependency { .. })
        ));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_resolve_all_covers_every_registration() {
        let mut container = DependencyContainer::new("all");
        container.register(provider("Network", "network"), vec![]);
        container.register(provider("Compute", "compute"), vec!["Network".to_string()]);
        container.register(provider("Identity", "identity"), vec!["Network".to_string()]);

        let resolved = container.resolve_all().unwrap();
        assert_eq!(resolved.len(), 3);
        assert!(resolved.contains_key("Network"));
        assert!(resolved.contains_key("Compute"));
        assert!(resolved.contains_key("Identity"));
    }

    #[test]
    fn test_validate_reports_every_missing_dependency() {
        let mut container = DependencyContainer::new("invalid");
        container.register(provider("Compute", "compute"), vec!["Network".to_string()]);
        container.register(provider("Cluster", "cluster"), vec!["Storage".to_string()]);

        let report = container.validate();
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 2);
        assert!(!report.analysis["Compute"].dependencies[0].satisfied);
        assert!(!report.analysis["Cluster"].dependencies[0].satisfied);
    }

    #[test]
    fn test_dependency_info_snapshot() {
        let mut container = DependencyContainer::new("diag");
        container.register_singleton("Prebuilt", stub("prebuilt"));
        container.register(provider("Network", "network"), vec![]);
        container.register(provider("Compute", "compute"), vec!["Network".to_string()]);

        let info = container.dependency_info();
        assert_eq!(info.container_name, "diag");
        assert!(info.container_id.starts_with("dic-"));
        assert_eq!(info.registered_types, ["Compute", "Network"]);
        assert_eq!(info.singletons, ["Prebuilt"]);
        assert_eq!(info.total_providers, 2);
        assert_eq!(info.total_singletons, 1);
        assert_eq!(
            info.dependency_graph["Compute"],
            vec!["Network".to_string()]
        );
    }
}
