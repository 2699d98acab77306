//! Identity resource factories and the identity module

use crate::resource::{null_resource, short_id, timestamp, Tags};
use serde_json::json;
use serde_json::Value;
use terragen_core::{ExportedDocument, Injectable, ResourceNode};

const ACCOUNT_ID: &str = "123456789012";
const POLICY_VERSION: &str = "2012-10-17";

/// Builds IAM policy records with embedded policy documents
pub struct PolicyFactory;

impl PolicyFactory {
    /// Compute-management policy
    pub fn compute_policy(name: &str) -> ResourceNode {
        let document = json!({
            "Version": POLICY_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Action": [
                    "ec2:DescribeInstances",
                    "ec2:StartInstances",
                    "ec2:StopInstances",
                ],
                "Resource": ["*"],
            }],
        });
        let triggers = json!({
            "resource_type": "iam_policy",
            "name": name,
            "policy_id": short_id("pol"),
            "policy_type": "compute",
            "policy_document": document,
            "created_at": timestamp(),
        });
        ResourceNode::new(name, null_resource(&format!("iam_policy_{name}"), triggers))
    }

    /// Cluster-administration policy scoped to one cluster
    pub fn cluster_policy(name: &str, cluster_name: &str) -> ResourceNode {
        let document = json!({
            "Version": POLICY_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Action": [
                    "eks:DescribeCluster",
                    "eks:ListClusters",
                    "eks:DescribeNodegroup",
                    "eks:ListNodegroups",
                ],
                "Resource": [format!("arn:aws:eks:*:*:cluster/{cluster_name}")],
            }],
        });
        let triggers = json!({
            "resource_type": "iam_policy",
            "name": name,
            "policy_id": short_id("pol"),
            "policy_type": "kubernetes",
            "cluster_dependency": cluster_name,
            "policy_document": document,
            "created_at": timestamp(),
        });
        ResourceNode::new(name, null_resource(&format!("iam_policy_{name}"), triggers))
            .with_dependency(cluster_name)
    }

    /// Network-management policy scoped to one VPC
    pub fn network_policy(name: &str, vpc_name: &str) -> ResourceNode {
        let document = json!({
            "Version": POLICY_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Action": [
                    "ec2:DescribeVpcs",
                    "ec2:DescribeSubnets",
                    "ec2:DescribeInternetGateways",
                    "ec2:DescribeRouteTables",
                    "ec2:CreateSecurityGroup",
                    "ec2:AuthorizeSecurityGroupIngress",
                ],
                "Resource": "*",
            }],
        });
        let triggers = json!({
            "resource_type": "iam_policy",
            "name": name,
            "policy_id": short_id("pol"),
            "policy_type": "network",
            "vpc_dependency": vpc_name,
            "policy_document": document,
            "created_at": timestamp(),
        });
        ResourceNode::new(name, null_resource(&format!("iam_policy_{name}"), triggers))
            .with_dependency(vpc_name)
    }
}

/// Builds IAM role records
pub struct RoleFactory;

impl RoleFactory {
    /// Role assumable by an AWS service
    pub fn service_role(
        name: &str,
        service: &str,
        policies: &[String],
        tags: &Tags,
    ) -> ResourceNode {
        let trust_policy = json!({
            "Version": POLICY_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": format!("{service}.amazonaws.com") },
                "Action": "sts:AssumeRole",
            }],
        });
        let triggers = json!({
            "resource_type": "iam_role",
            "name": name,
            "role_id": short_id("role"),
            "arn": format!("arn:aws:iam::{ACCOUNT_ID}:role/{name}"),
            "service": service,
            "trust_policy": trust_policy,
            "attached_policies": policies,
            "created_at": timestamp(),
            "tags": tags,
        });
        ResourceNode::new(name, null_resource(&format!("iam_role_{name}"), triggers))
            .with_dependencies(policies.iter().cloned())
    }

    /// Role assumable by account users
    pub fn user_role(name: &str, policies: &[String], tags: &Tags) -> ResourceNode {
        let trust_policy = json!({
            "Version": POLICY_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "AWS": format!("arn:aws:iam::{ACCOUNT_ID}:root") },
                "Action": "sts:AssumeRole",
            }],
        });
        let triggers = json!({
            "resource_type": "iam_role",
            "name": name,
            "role_id": short_id("role"),
            "arn": format!("arn:aws:iam::{ACCOUNT_ID}:role/{name}"),
            "role_type": "user_assumable",
            "trust_policy": trust_policy,
            "attached_policies": policies,
            "created_at": timestamp(),
            "tags": tags,
        });
        ResourceNode::new(name, null_resource(&format!("iam_role_{name}"), triggers))
            .with_dependencies(policies.iter().cloned())
    }
}

/// Builds IAM user records
pub struct UserFactory;

impl UserFactory {
    /// Programmatic-access user for services and pipelines
    pub fn service_user(name: &str, policies: &[String], tags: &Tags) -> ResourceNode {
        let triggers = json!({
            "resource_type": "iam_user",
            "name": name,
            "user_id": short_id("user"),
            "arn": format!("arn:aws:iam::{ACCOUNT_ID}:user/{name}"),
            "user_type": "service",
            "attached_policies": policies,
            "programmatic_access": "true",
            "console_access": "false",
            "created_at": timestamp(),
            "tags": tags,
        });
        ResourceNode::new(name, null_resource(&format!("iam_user_{name}"), triggers))
            .with_dependencies(policies.iter().cloned())
    }
}

/// Bundles policies, roles and users into reusable RBAC sets
pub struct IdentityModule {
    name: String,
    resources: Vec<ResourceNode>,
}

impl IdentityModule {
    /// Create an empty identity module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
        }
    }

    /// The module's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// RBAC for one Kubernetes cluster: admin policy, node role, CI user
    pub fn add_cluster_rbac(&mut self, cluster_name: &str, tags: &Tags) -> &mut Self {
        let policy_name = format!("{cluster_name}_admin_policy");
        self.resources
            .push(PolicyFactory::cluster_policy(&policy_name, cluster_name));
        self.resources.push(RoleFactory::service_role(
            &format!("{cluster_name}_node_role"),
            "ec2",
            std::slice::from_ref(&policy_name),
            tags,
        ));
        self.resources.push(UserFactory::service_user(
            &format!("{cluster_name}_cicd_user"),
            std::slice::from_ref(&policy_name),
            tags,
        ));
        self
    }

    /// RBAC for administering one VPC: network policy and admin role
    pub fn add_network_rbac(&mut self, vpc_name: &str, tags: &Tags) -> &mut Self {
        let policy_name = format!("{vpc_name}_network_policy");
        self.resources
            .push(PolicyFactory::network_policy(&policy_name, vpc_name));
        self.resources.push(RoleFactory::user_role(
            &format!("{vpc_name}_network_admin"),
            std::slice::from_ref(&policy_name),
            tags,
        ));
        self
    }

    /// RBAC for standalone compute: compute policy and instance role
    pub fn add_compute_rbac(&mut self, compute_name: &str, tags: &Tags) -> &mut Self {
        let policy_name = format!("{compute_name}_compute_policy");
        self.resources
            .push(PolicyFactory::compute_policy(&policy_name));
        self.resources.push(RoleFactory::service_role(
            &format!("{compute_name}_instance_role"),
            "ec2",
            std::slice::from_ref(&policy_name),
            tags,
        ));
        self
    }

    /// Number of records in the module
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Payload records in insertion order
    pub fn resources(&self) -> Vec<Value> {
        self.resources.iter().map(|r| r.payload().clone()).collect()
    }
}

impl Injectable for IdentityModule {
    fn export(&self) -> anyhow::Result<ExportedDocument> {
        Ok(ExportedDocument::from_resources(self.resources()))
    }

    fn dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .resources
            .iter()
            .flat_map(|r| r.dependencies().iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_rbac_adds_policy_role_and_user() {
        let mut identity = IdentityModule::new("test");
        identity.add_cluster_rbac("demo-cluster", &Tags::new());

        assert_eq!(identity.resource_count(), 3);
        let resources = identity.resources();
        assert!(resources[0]["null_resource"][0]
            .as_object()
            .unwrap()
            .contains_key("iam_policy_demo-cluster_admin_policy"));
    }

    #[test]
    fn test_roles_depend_on_their_policies() {
        let role = RoleFactory::service_role(
            "node_role",
            "ec2",
            &["admin_policy".to_string()],
            &Tags::new(),
        );
        assert_eq!(role.dependencies(), ["admin_policy".to_string()]);
    }

    #[test]
    fn test_export_matches_insertion_order() {
        let mut identity = IdentityModule::new("test");
        identity
            .add_network_rbac("main", &Tags::new())
            .add_compute_rbac("edge", &Tags::new());

        let document = identity.export().unwrap();
        assert_eq!(document.len(), 4);
    }
}
