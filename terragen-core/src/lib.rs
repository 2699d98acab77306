//! Terragen core: dependency resolution and composite aggregation
//!
//! This crate turns independently defined infrastructure modules into one
//! ordered resource document:
//! - Provider registration with declared dependency lists
//! - Cycle detection and deterministic resolution ordering
//! - Resolve-once, memoized module instantiation
//! - Composite resource trees and order-preserving document aggregation

pub mod composite;
pub mod config;
pub mod container;
pub mod document;
pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod provider;

pub use composite::{ComponentNode, CompositeNode, ResourceNode};
pub use config::{BuildConfig, ClusterSettings, NetworkSettings};
pub use container::{
    DependencyContainer, DependencyInfo, DependencyStatus, TypeAnalysis, ValidationReport,
};
pub use document::ExportedDocument;
pub use error::{ContainerError, Result};
pub use graph::DependencyGraph;
pub use orchestrator::{
    ModuleExport, OrchestrationResult, Orchestrator, OrchestratorInfo, CLUSTER_TYPE, COMPUTE_TYPE,
    IDENTITY_TYPE, NETWORK_TYPE,
};
pub use provider::{FactoryProvider, Injectable, InstanceProvider, ModuleFactory, Provider};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        BuildConfig, CompositeNode, ContainerError, DependencyContainer, ExportedDocument,
        Injectable, InstanceProvider, Orchestrator, Provider, ResourceNode, Result,
    };
}
