//! Integration tests for resolution ordering and orchestration

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use terragen_core::{
    ContainerError, DependencyContainer, ExportedDocument, Injectable, InstanceProvider,
    Orchestrator, Provider,
};

struct RecordModule {
    label: &'static str,
}

impl Injectable for RecordModule {
    fn export(&self) -> anyhow::Result<ExportedDocument> {
        Ok(ExportedDocument::from_resources(vec![
            json!({ "label": self.label }),
        ]))
    }
}

struct BrokenModule;

impl Injectable for BrokenModule {
    fn export(&self) -> anyhow::Result<ExportedDocument> {
        anyhow::bail!("cluster state is incomplete")
    }
}

fn module(label: &'static str) -> Arc<dyn Injectable> {
    Arc::new(RecordModule { label })
}

fn provider(type_name: &str, label: &'static str) -> Arc<dyn Provider> {
    Arc::new(InstanceProvider::new(type_name, module(label)))
}

fn position(order: &[String], name: &str) -> usize {
    order.iter().position(|n| n == name).unwrap()
}

#[test]
fn network_resolves_before_its_dependents() {
    let mut container = DependencyContainer::new("scenario");
    container.register(provider("Network", "net"), vec![]);
    container.register(provider("Compute", "compute"), vec!["Network".to_string()]);
    container.register(provider("Identity", "identity"), vec!["Network".to_string()]);

    let order = container.resolution_order().unwrap();
    assert_eq!(order.len(), 3);
    assert!(position(&order, "Network") < position(&order, "Compute"));
    assert!(position(&order, "Network") < position(&order, "Identity"));

    let resolved = container.resolve_all().unwrap();
    assert_eq!(resolved.len(), 3);
}

#[test]
fn mutual_dependency_is_a_circular_dependency_error() {
    let mut container = DependencyContainer::new("cycle");
    container.register(provider("A", "a"), vec!["B".to_string()]);
    container.register(provider("B", "b"), vec!["A".to_string()]);

    match container.resolution_order() {
        Err(ContainerError::CircularDependency { path }) => {
            assert!(path.contains(&"A".to_string()));
            assert!(path.contains(&"B".to_string()));
        }
        other => panic!("expected CircularDependency, got {other:?}"),
    }
}

#[test]
fn resolve_on_an_empty_container_fails() {
    let mut container = DependencyContainer::new("empty");
    assert!(matches!(
        container.resolve("Unregistered"),
        Err(ContainerError::UnregisteredType { type_name }) if type_name == "Unregistered"
    ));
}

#[test]
fn one_failing_export_does_not_hide_the_others() {
    let mut orchestrator = Orchestrator::new("partial");
    orchestrator.register_network(module("network"));
    orchestrator.register_compute(module("compute"), None);
    orchestrator.register_cluster(Arc::new(BrokenModule), None);

    let result = orchestrator.orchestrate().unwrap();

    assert_eq!(result.total_modules, 3);
    assert_eq!(result.modules.len(), 3);

    let failures = result.export_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "KubernetesCluster");
    assert!(failures[0].1.contains("cluster state is incomplete"));

    assert!(result.modules["NetworkInfrastructure"].document().is_some());
    assert!(result.modules["ComputeResources"].document().is_some());
}

#[test]
fn orchestration_merges_documents_in_resolution_order() {
    let mut orchestrator = Orchestrator::new("merge");
    orchestrator.register_network(module("network"));
    orchestrator.register_compute(module("compute"), None);
    orchestrator.register_identity(module("identity"), None);

    let result = orchestrator.orchestrate().unwrap();
    let merged = result.merged_document();

    assert_eq!(merged.len(), 3);
    // The network has no dependencies, so its record comes first.
    assert_eq!(merged.resources[0]["label"], "network");
}

#[test]
fn component_accessor_is_soft() {
    let mut orchestrator = Orchestrator::new("soft");
    orchestrator.register_network(module("network"));

    assert!(orchestrator.component("NetworkInfrastructure").is_none());
    orchestrator.orchestrate().unwrap();
    assert!(orchestrator.component("NetworkInfrastructure").is_some());
    assert!(orchestrator.component("NoSuchModule").is_none());
}

#[test]
fn seeded_singleton_takes_part_in_orchestration() {
    let mut orchestrator = Orchestrator::new("seeded");
    let prebuilt = module("prebuilt-network");
    orchestrator
        .container_mut()
        .register_singleton("NetworkInfrastructure", Arc::clone(&prebuilt));
    orchestrator.register_compute(module("compute"), None);

    let result = orchestrator.orchestrate().unwrap();
    // Only the registered provider is exported; the singleton satisfies
    // the dependency without being re-resolved.
    assert_eq!(result.total_modules, 1);
    assert!(result.modules["ComputeResources"].document().is_some());
    assert_eq!(result.dependency_info.total_singletons, 2);
}
