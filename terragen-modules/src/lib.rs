//! Terragen domain modules
//!
//! Record factories and composite modules for the four built-in
//! infrastructure kinds:
//! - Network: VPCs, subnets, gateways and route tables
//! - Identity: policies, roles and users bundled into RBAC sets
//! - Compute: virtual machines, containers and cluster nodes
//! - Kubernetes: a cluster with addons, namespaces and applications
//!
//! All payloads are opaque Terraform-JSON `null_resource` records; the core
//! engine only orders and concatenates them.

pub mod compute;
pub mod error;
pub mod identity;
pub mod kubernetes;
pub mod network;
pub mod resource;

pub use compute::{
    ClusterFactory, ComputeFactory, ComputeKind, ComputeModule, ComputeSpec, NodeRole,
};
pub use error::{ModuleError, Result};
pub use identity::{IdentityModule, PolicyFactory, RoleFactory, UserFactory};
pub use kubernetes::{AppSpec, ClusterModule, NetworkAttachment};
pub use network::{NetworkFactory, NetworkInfrastructure, NetworkStackBuilder, Route, VpcComposite};
pub use resource::Tags;
