//! Compute resource factories and parameterized specs

use crate::resource::{null_resource, private_ip, short_id, timestamp, Tags};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use terragen_core::{CompositeNode, ExportedDocument, Injectable, ResourceNode};
use tracing::debug;

const KUBERNETES_VERSION: &str = "1.28.0";

/// Kinds of compute resources the factory can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeKind {
    /// A standalone virtual machine
    VirtualMachine,
    /// A standalone container
    Container,
    /// A Kubernetes worker node
    KubernetesNode,
    /// A Kubernetes master node
    KubernetesMaster,
}

impl ComputeKind {
    /// The `resource_type` string stamped into generated records
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeKind::VirtualMachine => "virtual_machine",
            ComputeKind::Container => "container",
            ComputeKind::KubernetesNode => "kubernetes_node",
            ComputeKind::KubernetesMaster => "kubernetes_master",
        }
    }
}

/// Role a node plays inside a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Control-plane node
    Master,
    /// Workload node
    Worker,
}

impl NodeRole {
    fn kind(&self) -> ComputeKind {
        match self {
            NodeRole::Master => ComputeKind::KubernetesMaster,
            NodeRole::Worker => ComputeKind::KubernetesNode,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Master => "master",
            NodeRole::Worker => "worker",
        }
    }
}

/// Builds individual compute resource records
pub struct ComputeFactory;

impl ComputeFactory {
    /// Simulated virtual machine
    pub fn virtual_machine(
        name: &str,
        instance_type: &str,
        subnet_name: Option<&str>,
        tags: &Tags,
    ) -> ResourceNode {
        let triggers = json!({
            "resource_type": ComputeKind::VirtualMachine.as_str(),
            "name": name,
            "instance_id": short_id("i"),
            "instance_type": instance_type,
            "subnet_dependency": subnet_name.unwrap_or("default"),
            "private_ip": private_ip(),
            "state": "running",
            "created_at": timestamp(),
            "tags": tags,
        });
        let node = ResourceNode::new(name, null_resource(&format!("vm_{name}"), triggers));
        match subnet_name {
            Some(subnet) => node.with_dependency(subnet),
            None => node,
        }
    }

    /// Simulated container
    pub fn container(
        name: &str,
        image: &str,
        ports: &[u16],
        environment: &BTreeMap<String, String>,
        tags: &Tags,
    ) -> ResourceNode {
        let triggers = json!({
            "resource_type": ComputeKind::Container.as_str(),
            "name": name,
            "container_id": short_id("cnt"),
            "image": image,
            "ports": ports,
            "environment": environment,
            "status": "running",
            "restart_policy": "always",
            "created_at": timestamp(),
            "tags": tags,
        });
        ResourceNode::new(name, null_resource(&format!("container_{name}"), triggers))
    }

    /// Simulated Kubernetes node
    pub fn kubernetes_node(
        name: &str,
        cluster_name: &str,
        role: NodeRole,
        instance_type: &str,
        subnet_name: Option<&str>,
        tags: &Tags,
    ) -> ResourceNode {
        let triggers = json!({
            "resource_type": role.kind().as_str(),
            "name": name,
            "node_id": short_id("k8s"),
            "cluster_dependency": cluster_name,
            "node_type": role.as_str(),
            "instance_type": instance_type,
            "subnet_dependency": subnet_name.unwrap_or("default"),
            "kubernetes_version": KUBERNETES_VERSION,
            "container_runtime": "containerd",
            "private_ip": private_ip(),
            "status": "Ready",
            "created_at": timestamp(),
            "tags": tags,
        });
        let node = ResourceNode::new(name, null_resource(&format!("k8s_node_{name}"), triggers))
            .with_dependency(cluster_name);
        match subnet_name {
            Some(subnet) => node.with_dependency(subnet),
            None => node,
        }
    }
}

/// Builds a full simulated cluster: one master, `node_count` workers
/// distributed across the given subnets, and a cluster metadata record
pub struct ClusterFactory;

impl ClusterFactory {
    /// Simulated minikube-style cluster
    pub fn minikube_cluster(
        cluster_name: &str,
        node_count: usize,
        master_instance_type: &str,
        worker_instance_type: &str,
        subnet_names: &[String],
        tags: &Tags,
    ) -> Vec<ResourceNode> {
        let fallback = ["default".to_string()];
        let subnets: &[String] = if subnet_names.is_empty() {
            &fallback
        } else {
            subnet_names
        };

        let mut resources = Vec::with_capacity(node_count + 2);

        let mut master_tags = tags.clone();
        master_tags.insert("role".to_string(), "master".to_string());
        resources.push(ComputeFactory::kubernetes_node(
            &format!("{cluster_name}-master"),
            cluster_name,
            NodeRole::Master,
            master_instance_type,
            Some(&subnets[0]),
            &master_tags,
        ));

        for i in 0..node_count {
            let subnet = &subnets[i % subnets.len()];
            let mut worker_tags = tags.clone();
            worker_tags.insert("role".to_string(), "worker".to_string());
            worker_tags.insert("worker_id".to_string(), (i + 1).to_string());
            resources.push(ComputeFactory::kubernetes_node(
                &format!("{cluster_name}-worker-{}", i + 1),
                cluster_name,
                NodeRole::Worker,
                worker_instance_type,
                Some(subnet),
                &worker_tags,
            ));
        }

        let metadata = json!({
            "resource_type": "kubernetes_cluster",
            "cluster_name": cluster_name,
            "cluster_id": short_id("cls"),
            "total_nodes": (node_count + 1).to_string(),
            "master_count": "1",
            "worker_count": node_count.to_string(),
            "kubernetes_version": KUBERNETES_VERSION,
            "cluster_type": "minikube",
            "created_at": timestamp(),
            "tags": tags,
        });
        resources.push(ResourceNode::new(
            cluster_name,
            null_resource(&format!("cluster_{cluster_name}"), metadata),
        ));

        debug!("built cluster '{cluster_name}' with {node_count} workers");
        resources
    }
}

/// Typed description of a compute resource to build.
///
/// The variant says exactly which factory runs and with which fields; no
/// key probing against a free-form configuration map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComputeSpec {
    /// A standalone virtual machine
    VirtualMachine {
        /// Machine name
        name: String,
        /// Instance type
        #[serde(default = "default_instance_type")]
        instance_type: String,
        /// Subnet the machine attaches to
        #[serde(default)]
        subnet_name: Option<String>,
        /// Resource tags
        #[serde(default)]
        tags: Tags,
    },
    /// A standalone container
    Container {
        /// Container name
        name: String,
        /// Image reference
        #[serde(default = "default_image")]
        image: String,
        /// Exposed ports
        #[serde(default = "default_ports")]
        ports: Vec<u16>,
        /// Environment variables
        #[serde(default)]
        environment: BTreeMap<String, String>,
        /// Resource tags
        #[serde(default)]
        tags: Tags,
    },
    /// A full Kubernetes cluster
    KubernetesCluster {
        /// Cluster name
        name: String,
        /// Number of worker nodes
        #[serde(default = "default_node_count")]
        node_count: usize,
        /// Master instance type
        #[serde(default = "default_instance_type")]
        master_instance_type: String,
        /// Worker instance type
        #[serde(default = "default_instance_type")]
        worker_instance_type: String,
        /// Subnets the nodes are distributed across
        #[serde(default)]
        subnet_names: Vec<String>,
        /// Resource tags
        #[serde(default)]
        tags: Tags,
    },
}

impl ComputeSpec {
    /// The described resource's name
    pub fn name(&self) -> &str {
        match self {
            ComputeSpec::VirtualMachine { name, .. }
            | ComputeSpec::Container { name, .. }
            | ComputeSpec::KubernetesCluster { name, .. } => name,
        }
    }

    /// Build the resource records this spec describes
    pub fn build(&self) -> Vec<ResourceNode> {
        match self {
            ComputeSpec::VirtualMachine {
                name,
                instance_type,
                subnet_name,
                tags,
            } => vec![ComputeFactory::virtual_machine(
                name,
                instance_type,
                subnet_name.as_deref(),
                tags,
            )],
            ComputeSpec::Container {
                name,
                image,
                ports,
                environment,
                tags,
            } => vec![ComputeFactory::container(name, image, ports, environment, tags)],
            ComputeSpec::KubernetesCluster {
                name,
                node_count,
                master_instance_type,
                worker_instance_type,
                subnet_names,
                tags,
            } => ClusterFactory::minikube_cluster(
                name,
                *node_count,
                master_instance_type,
                worker_instance_type,
                subnet_names,
                tags,
            ),
        }
    }
}

/// The compute module: resources built from specs, exported as one document
pub struct ComputeModule {
    name: String,
    node: CompositeNode,
}

impl ComputeModule {
    /// Create an empty compute module
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            node: CompositeNode::new(format!("compute_{name}")),
            name,
        }
    }

    /// The module's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a spec's resources and move them into the module
    pub fn add_spec(&mut self, spec: &ComputeSpec) -> &mut Self {
        for resource in spec.build() {
            self.node.add(resource);
        }
        self
    }

    /// Number of records in the module
    pub fn resource_count(&self) -> usize {
        self.node.child_count()
    }
}

impl Injectable for ComputeModule {
    fn export(&self) -> anyhow::Result<ExportedDocument> {
        Ok(self.node.export_document())
    }

    fn dependencies(&self) -> Vec<String> {
        self.node.dependencies()
    }
}

fn default_instance_type() -> String {
    "t3.medium".to_string()
}

fn default_image() -> String {
    "nginx:latest".to_string()
}

fn default_ports() -> Vec<u16> {
    vec![80]
}

fn default_node_count() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_has_master_workers_and_metadata() {
        let subnets = vec!["net_1".to_string(), "net_2".to_string()];
        let resources = ClusterFactory::minikube_cluster(
            "demo",
            3,
            "t3.medium",
            "t3.medium",
            &subnets,
            &Tags::new(),
        );

        // master + 3 workers + metadata record
        assert_eq!(resources.len(), 5);
        assert_eq!(resources[0].name(), "demo-master");
        assert_eq!(resources[4].name(), "demo");
    }

    #[test]
    fn test_workers_are_distributed_across_subnets() {
        let subnets = vec!["net_1".to_string(), "net_2".to_string()];
        let resources = ClusterFactory::minikube_cluster(
            "demo",
            4,
            "t3.medium",
            "t3.medium",
            &subnets,
            &Tags::new(),
        );

        let worker_subnets: Vec<_> = resources[1..5]
            .iter()
            .map(|r| r.dependencies()[1].clone())
            .collect();
        assert_eq!(worker_subnets, ["net_1", "net_2", "net_1", "net_2"]);
    }

    #[test]
    fn test_nodes_depend_on_cluster_and_subnet() {
        let node = ComputeFactory::kubernetes_node(
            "demo-worker-1",
            "demo",
            NodeRole::Worker,
            "t3.medium",
            Some("net_1"),
            &Tags::new(),
        );
        assert_eq!(node.dependencies(), ["demo".to_string(), "net_1".to_string()]);
    }

    #[test]
    fn test_specs_build_through_the_matching_factory() {
        let mut module = ComputeModule::new("extra");
        module
            .add_spec(&ComputeSpec::VirtualMachine {
                name: "bastion".to_string(),
                instance_type: "t3.micro".to_string(),
                subnet_name: Some("net_1".to_string()),
                tags: Tags::new(),
            })
            .add_spec(&ComputeSpec::Container {
                name: "grafana".to_string(),
                image: "grafana/grafana:latest".to_string(),
                ports: vec![3000],
                environment: BTreeMap::new(),
                tags: Tags::new(),
            });

        assert_eq!(module.resource_count(), 2);
        let document = module.export().unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(module.dependencies(), ["net_1".to_string()]);
    }

    #[test]
    fn test_spec_round_trips_through_serde() {
        let spec: ComputeSpec = serde_json::from_value(serde_json::json!({
            "type": "virtual_machine",
            "name": "bastion",
        }))
        .unwrap();

        match spec {
            ComputeSpec::VirtualMachine { instance_type, .. } => {
                assert_eq!(instance_type, "t3.medium");
            }
            other => panic!("expected a virtual machine spec, got {other:?}"),
        }
    }
}
