//! Build configuration
//!
//! One [`BuildConfig`] value is constructed at process start and passed by
//! reference to every component that needs it. There is no ambient global
//! and no hidden shared state.

use crate::error::{ContainerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration for one build invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Project name, used as the prefix for generated resource names
    #[serde(default = "default_project")]
    pub project: String,

    /// Deployment environment label
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Target region label
    #[serde(default = "default_region")]
    pub region: String,

    /// Network topology settings
    #[serde(default)]
    pub network: NetworkSettings,

    /// Kubernetes cluster settings
    #[serde(default)]
    pub cluster: ClusterSettings,
}

/// Network topology settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// VPC name; defaults to `<project>-vpc`
    #[serde(default)]
    pub vpc_name: Option<String>,

    /// Base CIDR block for the VPC
    #[serde(default = "default_vpc_cidr")]
    pub vpc_cidr: String,

    /// Number of private subnets to create
    #[serde(default = "default_subnet_count")]
    pub subnet_count: usize,
}

/// Kubernetes cluster settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Cluster name; defaults to `<project>-cluster`
    #[serde(default)]
    pub cluster_name: Option<String>,

    /// Number of worker nodes
    #[serde(default = "default_node_count")]
    pub node_count: usize,

    /// Instance type for the master node
    #[serde(default = "default_instance_type")]
    pub master_instance_type: String,

    /// Instance type for worker nodes
    #[serde(default = "default_instance_type")]
    pub worker_instance_type: String,
}

impl BuildConfig {
    /// Create a configuration with defaults for the given project
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| ContainerError::ConfigError(format!("failed to parse TOML: {e}")))
    }

    /// Parse a configuration from JSON
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .map_err(|e| ContainerError::ConfigError(format!("failed to parse JSON: {e}")))
    }

    /// Effective VPC name
    pub fn vpc_name(&self) -> String {
        self.network
            .vpc_name
            .clone()
            .unwrap_or_else(|| format!("{}-vpc", self.project))
    }

    /// Effective cluster name
    pub fn cluster_name(&self) -> String {
        self.cluster
            .cluster_name
            .clone()
            .unwrap_or_else(|| format!("{}-cluster", self.project))
    }

    /// Standard tags stamped on every resource this build creates
    pub fn tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Project".to_string(), self.project.clone()),
            ("Environment".to_string(), self.environment.clone()),
            ("ManagedBy".to_string(), "terragen".to_string()),
        ])
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            environment: default_environment(),
            region: default_region(),
            network: NetworkSettings::default(),
            cluster: ClusterSettings::default(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            vpc_name: None,
            vpc_cidr: default_vpc_cidr(),
            subnet_count: default_subnet_count(),
        }
    }
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            cluster_name: None,
            node_count: default_node_count(),
            master_instance_type: default_instance_type(),
            worker_instance_type: default_instance_type(),
        }
    }
}

fn default_project() -> String {
    "private-network-k8s".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_vpc_cidr() -> String {
    "10.0.0.0/16".to_string()
}

fn default_subnet_count() -> usize {
    2
}

fn default_node_count() -> usize {
    3
}

fn default_instance_type() -> String {
    "t3.medium".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names_follow_project() {
        let config = BuildConfig::new("edge");
        assert_eq!(config.vpc_name(), "edge-vpc");
        assert_eq!(config.cluster_name(), "edge-cluster");
    }

    #[test]
    fn test_explicit_names_win() {
        let mut config = BuildConfig::new("edge");
        config.network.vpc_name = Some("custom-vpc".to_string());
        assert_eq!(config.vpc_name(), "custom-vpc");
    }

    #[test]
    fn test_from_toml_applies_defaults() {
        let config = BuildConfig::from_toml(
            r#"
            project = "demo"

            [cluster]
            node_count = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.project, "demo");
        assert_eq!(config.cluster.node_count, 5);
        assert_eq!(config.network.subnet_count, 2);
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        assert!(matches!(
            BuildConfig::from_toml("project = ["),
            Err(ContainerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_tags_include_project_and_environment() {
        let tags = BuildConfig::new("demo").tags();
        assert_eq!(tags["Project"], "demo");
        assert_eq!(tags["Environment"], "development");
        assert_eq!(tags["ManagedBy"], "terragen");
    }
}
