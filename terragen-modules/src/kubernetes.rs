//! Kubernetes cluster module with explicitly injected network dependencies

use crate::compute::ClusterFactory;
use crate::error::{ModuleError, Result};
use crate::identity::IdentityModule;
use crate::network::NetworkInfrastructure;
use crate::resource::{null_resource, timestamp, Tags};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use terragen_core::{ClusterSettings, CompositeNode, ExportedDocument, Injectable, ResourceNode};
use tracing::debug;

/// Network facts a cluster needs from the network module
#[derive(Debug, Clone)]
pub struct NetworkAttachment {
    /// Name of the VPC the cluster lives in
    pub vpc_name: String,
    /// Subnets the nodes are distributed across
    pub subnet_names: Vec<String>,
}

impl NetworkAttachment {
    /// Capture the relevant facts from a built network module
    pub fn from_network(network: &NetworkInfrastructure) -> Self {
        Self {
            vpc_name: network
                .vpc_names()
                .first()
                .cloned()
                .unwrap_or_else(|| "default".to_string()),
            subnet_names: network.subnet_names().to_vec(),
        }
    }
}

/// Description of an application to deploy into the cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSpec {
    /// Application name
    pub name: String,
    /// Namespace the application deploys into
    pub namespace: String,
    /// Image reference
    #[serde(default = "default_image")]
    pub image: String,
    /// Number of replicas
    #[serde(default = "default_replicas")]
    pub replicas: usize,
    /// Exposed ports
    #[serde(default = "default_ports")]
    pub ports: Vec<u16>,
    /// Environment variables
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

/// The cluster module: nodes, addons, namespaces, applications and
/// cluster-scoped RBAC, with the network dependency injected explicitly
pub struct ClusterModule {
    name: String,
    network: Option<NetworkAttachment>,
    cluster_name: Option<String>,
    cluster: CompositeNode,
    namespaces: Vec<ResourceNode>,
    applications: Vec<ResourceNode>,
    identity: IdentityModule,
}

impl ClusterModule {
    /// Create an empty cluster module
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            cluster: CompositeNode::new(format!("cluster_{name}")),
            namespaces: Vec::new(),
            applications: Vec::new(),
            identity: IdentityModule::new(format!("{name}_cluster_identity")),
            network: None,
            cluster_name: None,
            name,
        }
    }

    /// The module's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the created cluster, if any
    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster_name.as_deref()
    }

    /// Number of namespaces added
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// Number of applications added
    pub fn application_count(&self) -> usize {
        // Each application contributes a deployment and a service record.
        self.applications.len() / 2
    }

    /// Inject the network facts this cluster builds on
    pub fn attach_network(&mut self, network: &NetworkInfrastructure) -> &mut Self {
        self.network = Some(NetworkAttachment::from_network(network));
        self
    }

    /// Create the cluster nodes, addons and RBAC.
    ///
    /// Fails with [`ModuleError::NetworkNotAttached`] when no network has
    /// been injected yet.
    pub fn create_cluster(
        &mut self,
        cluster_name: &str,
        settings: &ClusterSettings,
        tags: &Tags,
    ) -> Result<&mut Self> {
        let network = self.network.as_ref().ok_or(ModuleError::NetworkNotAttached)?;

        for node in ClusterFactory::minikube_cluster(
            cluster_name,
            settings.node_count,
            &settings.master_instance_type,
            &settings.worker_instance_type,
            &network.subnet_names,
            tags,
        ) {
            self.cluster.add(node);
        }
        for addon in addon_records(cluster_name, tags) {
            self.cluster.add(addon);
        }
        self.identity.add_cluster_rbac(cluster_name, tags);
        self.cluster_name = Some(cluster_name.to_string());

        debug!(
            "created cluster '{cluster_name}' with {} worker nodes",
            settings.node_count
        );
        Ok(self)
    }

    /// Add a namespace; the cluster must exist first
    pub fn add_namespace(&mut self, namespace: &str, labels: &Tags) -> Result<&mut Self> {
        let cluster_name = self.require_cluster(format!("namespace '{namespace}'"))?;
        let triggers = json!({
            "resource_type": "kubernetes_namespace",
            "namespace_name": namespace,
            "cluster_dependency": cluster_name,
            "labels": labels,
            "created_at": timestamp(),
        });
        self.namespaces.push(
            ResourceNode::new(
                namespace,
                null_resource(&format!("k8s_namespace_{namespace}"), triggers),
            )
            .with_dependency(cluster_name),
        );
        Ok(self)
    }

    /// Add an application (a deployment and its service); the cluster must
    /// exist first
    pub fn add_application(&mut self, spec: &AppSpec) -> Result<&mut Self> {
        let cluster_name = self.require_cluster(format!("application '{}'", spec.name))?;

        let deployment_triggers = json!({
            "resource_type": "kubernetes_deployment",
            "app_name": spec.name,
            "namespace_dependency": spec.namespace,
            "cluster_dependency": cluster_name,
            "image": spec.image,
            "replicas": spec.replicas.to_string(),
            "ports": spec.ports,
            "environment": spec.environment,
            "created_at": timestamp(),
        });
        self.applications.push(
            ResourceNode::new(
                &spec.name,
                null_resource(&format!("k8s_deployment_{}", spec.name), deployment_triggers),
            )
            .with_dependencies([spec.namespace.clone(), cluster_name.clone()]),
        );

        let service_triggers = json!({
            "resource_type": "kubernetes_service",
            "service_name": format!("{}-service", spec.name),
            "app_dependency": spec.name,
            "namespace_dependency": spec.namespace,
            "cluster_dependency": cluster_name,
            "service_type": "ClusterIP",
            "ports": spec.ports,
            "created_at": timestamp(),
        });
        self.applications.push(
            ResourceNode::new(
                format!("{}-service", spec.name),
                null_resource(&format!("k8s_service_{}", spec.name), service_triggers),
            )
            .with_dependencies([spec.name.clone(), spec.namespace.clone(), cluster_name]),
        );

        Ok(self)
    }

    fn require_cluster(&self, item: String) -> Result<String> {
        self.cluster_name
            .clone()
            .ok_or(ModuleError::ClusterNotCreated { item })
    }
}

impl Injectable for ClusterModule {
    fn export(&self) -> anyhow::Result<ExportedDocument> {
        // Cluster first, then namespaces, applications and RBAC.
        let mut document = self.cluster.export_document();
        document
            .resources
            .extend(self.namespaces.iter().map(|n| n.payload().clone()));
        document
            .resources
            .extend(self.applications.iter().map(|a| a.payload().clone()));
        document.resources.extend(self.identity.resources());
        Ok(document)
    }

    fn dependencies(&self) -> Vec<String> {
        match &self.network {
            Some(attachment) => {
                let mut names = vec![attachment.vpc_name.clone()];
                names.extend(attachment.subnet_names.iter().cloned());
                names.retain(|n| !n.is_empty());
                names
            }
            None => Vec::new(),
        }
    }
}

fn addon_records(cluster_name: &str, tags: &Tags) -> Vec<ResourceNode> {
    let dns = json!({
        "resource_type": "kubernetes_addon",
        "addon_name": "coredns",
        "cluster_dependency": cluster_name,
        "addon_version": "1.10.1",
        "enabled": "true",
        "replicas": "2",
        "created_at": timestamp(),
        "tags": tags,
    });
    let ingress = json!({
        "resource_type": "kubernetes_addon",
        "addon_name": "nginx-ingress",
        "cluster_dependency": cluster_name,
        "addon_version": "1.8.1",
        "enabled": "true",
        "service_type": "LoadBalancer",
        "created_at": timestamp(),
        "tags": tags,
    });
    let metrics = json!({
        "resource_type": "kubernetes_addon",
        "addon_name": "metrics-server",
        "cluster_dependency": cluster_name,
        "addon_version": "0.6.4",
        "enabled": "true",
        "created_at": timestamp(),
        "tags": tags,
    });

    vec![
        ResourceNode::new(
            format!("{cluster_name}-coredns"),
            null_resource(&format!("k8s_addon_dns_{cluster_name}"), dns),
        )
        .with_dependency(cluster_name),
        ResourceNode::new(
            format!("{cluster_name}-ingress"),
            null_resource(&format!("k8s_addon_ingress_{cluster_name}"), ingress),
        )
        .with_dependency(cluster_name),
        ResourceNode::new(
            format!("{cluster_name}-metrics"),
            null_resource(&format!("k8s_addon_metrics_{cluster_name}"), metrics),
        )
        .with_dependency(cluster_name),
    ]
}

fn default_image() -> String {
    "nginx:latest".to_string()
}

fn default_replicas() -> usize {
    2
}

fn default_ports() -> Vec<u16> {
    vec![80]
}
