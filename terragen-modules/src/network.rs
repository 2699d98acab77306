//! Network resource factories, composites and the network module

use crate::identity::IdentityModule;
use crate::resource::{null_resource, short_id, timestamp, Tags};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use terragen_core::{CompositeNode, ExportedDocument, Injectable, ResourceNode};
use tracing::debug;

/// A route table entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Destination CIDR block
    pub destination: String,
    /// Name of the target gateway or interface
    pub target: String,
}

/// Builds individual network resource records
pub struct NetworkFactory;

impl NetworkFactory {
    /// Simulated VPC record
    pub fn vpc(name: &str, cidr_block: &str, tags: &Tags) -> ResourceNode {
        let triggers = json!({
            "resource_type": "vpc",
            "name": name,
            "vpc_id": short_id("vpc"),
            "cidr_block": cidr_block,
            "enable_dns_hostnames": "true",
            "enable_dns_support": "true",
            "created_at": timestamp(),
            "tags": tags,
        });
        ResourceNode::new(name, null_resource(&format!("vpc_{name}"), triggers))
    }

    /// Simulated subnet record, depending on its VPC
    pub fn subnet(
        name: &str,
        vpc_name: &str,
        cidr_block: &str,
        availability_zone: &str,
        is_private: bool,
        tags: &Tags,
    ) -> ResourceNode {
        let triggers = json!({
            "resource_type": "subnet",
            "name": name,
            "subnet_id": short_id("subnet"),
            "vpc_dependency": vpc_name,
            "cidr_block": cidr_block,
            "availability_zone": availability_zone,
            "is_private": is_private.to_string(),
            "created_at": timestamp(),
            "tags": tags,
        });
        ResourceNode::new(name, null_resource(&format!("subnet_{name}"), triggers))
            .with_dependency(vpc_name)
    }

    /// Simulated internet gateway record, depending on its VPC
    pub fn internet_gateway(name: &str, vpc_name: &str, tags: &Tags) -> ResourceNode {
        let triggers = json!({
            "resource_type": "internet_gateway",
            "name": name,
            "igw_id": short_id("igw"),
            "vpc_dependency": vpc_name,
            "created_at": timestamp(),
            "tags": tags,
        });
        ResourceNode::new(name, null_resource(&format!("igw_{name}"), triggers))
            .with_dependency(vpc_name)
    }

    /// Simulated route table record, depending on its VPC
    pub fn route_table(name: &str, vpc_name: &str, routes: &[Route], tags: &Tags) -> ResourceNode {
        let triggers = json!({
            "resource_type": "route_table",
            "name": name,
            "rt_id": short_id("rtb"),
            "vpc_dependency": vpc_name,
            "routes": routes,
            "created_at": timestamp(),
            "tags": tags,
        });
        ResourceNode::new(name, null_resource(&format!("route_table_{name}"), triggers))
            .with_dependency(vpc_name)
    }
}

/// A VPC with its subnets, gateway and routing, grouped as one composite
pub struct VpcComposite {
    vpc_name: String,
    tags: Tags,
    node: CompositeNode,
    subnet_names: Vec<String>,
}

impl VpcComposite {
    /// Create the composite with its base VPC record
    pub fn new(vpc_name: impl Into<String>, cidr_block: &str, tags: Tags) -> Self {
        let vpc_name = vpc_name.into();
        let mut node = CompositeNode::new(format!("vpc_{vpc_name}"));
        node.add(NetworkFactory::vpc(&vpc_name, cidr_block, &tags));
        Self {
            vpc_name,
            tags,
            node,
            subnet_names: Vec::new(),
        }
    }

    /// The VPC's name
    pub fn vpc_name(&self) -> &str {
        &self.vpc_name
    }

    /// Subnet names added so far, in insertion order
    pub fn subnet_names(&self) -> &[String] {
        &self.subnet_names
    }

    /// The tags stamped on this VPC's resources
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Add a private subnet
    pub fn add_private_subnet(
        &mut self,
        subnet_name: &str,
        cidr_block: &str,
        availability_zone: &str,
    ) -> &mut Self {
        self.add_subnet(subnet_name, cidr_block, availability_zone, true)
    }

    /// Add a public subnet
    pub fn add_public_subnet(
        &mut self,
        subnet_name: &str,
        cidr_block: &str,
        availability_zone: &str,
    ) -> &mut Self {
        self.add_subnet(subnet_name, cidr_block, availability_zone, false)
    }

    fn add_subnet(
        &mut self,
        subnet_name: &str,
        cidr_block: &str,
        availability_zone: &str,
        is_private: bool,
    ) -> &mut Self {
        self.node.add(NetworkFactory::subnet(
            subnet_name,
            &self.vpc_name,
            cidr_block,
            availability_zone,
            is_private,
            &self.tags,
        ));
        self.subnet_names.push(subnet_name.to_string());
        self
    }

    /// Add the VPC's internet gateway
    pub fn add_internet_gateway(&mut self) -> &mut Self {
        let name = format!("{}_igw", self.vpc_name);
        self.node
            .add(NetworkFactory::internet_gateway(&name, &self.vpc_name, &self.tags));
        self
    }

    /// Add a route table
    pub fn add_route_table(&mut self, name: &str, routes: &[Route]) -> &mut Self {
        self.node
            .add(NetworkFactory::route_table(name, &self.vpc_name, routes, &self.tags));
        self
    }

    /// Consume the builder, yielding the underlying composite
    pub fn into_node(self) -> CompositeNode {
        self.node
    }
}

/// The network module: VPC composites plus their network-scoped RBAC
pub struct NetworkInfrastructure {
    name: String,
    node: CompositeNode,
    vpc_names: Vec<String>,
    subnet_names: Vec<String>,
    identity: IdentityModule,
}

impl NetworkInfrastructure {
    /// Create an empty network module
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            node: CompositeNode::new(format!("network_infrastructure_{name}")),
            vpc_names: Vec::new(),
            subnet_names: Vec::new(),
            identity: IdentityModule::new(format!("{name}_network_identity")),
            name,
        }
    }

    /// The module's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the VPCs added so far
    pub fn vpc_names(&self) -> &[String] {
        &self.vpc_names
    }

    /// Names of all subnets across every VPC
    pub fn subnet_names(&self) -> &[String] {
        &self.subnet_names
    }

    /// The module's network-scoped RBAC bundle
    pub fn identity(&self) -> &IdentityModule {
        &self.identity
    }

    /// Move a fully built VPC into the module and attach its RBAC
    pub fn add_vpc(&mut self, vpc: VpcComposite) -> &mut Self {
        self.identity.add_network_rbac(vpc.vpc_name(), vpc.tags());
        self.vpc_names.push(vpc.vpc_name().to_string());
        self.subnet_names.extend(vpc.subnet_names().iter().cloned());
        self.node.add(vpc.into_node());
        self
    }

    /// Standard architecture: a VPC with two private subnets in different
    /// zones, an internet gateway and a private route table
    pub fn two_subnet_architecture(
        &mut self,
        vpc_name: &str,
        base_cidr: &str,
        tags: &Tags,
    ) -> &mut Self {
        let mut vpc = VpcComposite::new(vpc_name, base_cidr, tags.clone());
        vpc.add_private_subnet(&format!("{vpc_name}_private_1"), "10.0.1.0/24", "us-east-1a")
            .add_private_subnet(&format!("{vpc_name}_private_2"), "10.0.2.0/24", "us-east-1b");
        vpc.add_internet_gateway();
        vpc.add_route_table(&format!("{vpc_name}_private_rt"), &[]);
        self.add_vpc(vpc)
    }

    /// Network resource payloads, without the RBAC records
    pub fn network_resources(&self) -> Vec<Value> {
        self.node.export()
    }
}

impl Injectable for NetworkInfrastructure {
    fn export(&self) -> anyhow::Result<ExportedDocument> {
        // Network resources first, then the module's RBAC records.
        let mut document = self.node.export_document();
        document.resources.extend(self.identity.resources());
        Ok(document)
    }

    fn dependencies(&self) -> Vec<String> {
        self.node.dependencies()
    }
}

/// Fluent builder over [`NetworkInfrastructure`]
pub struct NetworkStackBuilder {
    infrastructure: NetworkInfrastructure,
}

impl NetworkStackBuilder {
    /// Start a builder for the named module
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            infrastructure: NetworkInfrastructure::new(module_name),
        }
    }

    /// Configure a private network with `subnet_count` subnets.
    ///
    /// Two subnets get the standard architecture; any other count lays the
    /// subnets out dynamically, alternating between availability zones.
    pub fn with_private_network(
        mut self,
        vpc_name: &str,
        subnet_count: usize,
        base_cidr: &str,
        tags: &Tags,
    ) -> Self {
        if subnet_count == 2 {
            self.infrastructure
                .two_subnet_architecture(vpc_name, base_cidr, tags);
        } else {
            let mut vpc = VpcComposite::new(vpc_name, base_cidr, tags.clone());
            vpc.add_internet_gateway();
            for i in 0..subnet_count {
                let cidr = format!("10.0.{}.0/24", i + 1);
                let zone = if i % 2 == 0 { "us-east-1a" } else { "us-east-1b" };
                vpc.add_private_subnet(&format!("{vpc_name}_private_{}", i + 1), &cidr, zone);
            }
            vpc.add_route_table(&format!("{vpc_name}_private_rt"), &[]);
            self.infrastructure.add_vpc(vpc);
        }
        debug!("configured private network '{vpc_name}' with {subnet_count} subnets");
        self
    }

    /// Build and return the finished module
    pub fn build(self) -> NetworkInfrastructure {
        self.infrastructure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resource_type(record: &Value) -> String {
        let (_, entries) = record["null_resource"][0]
            .as_object()
            .unwrap()
            .iter()
            .next()
            .unwrap();
        entries[0]["triggers"]["resource_type"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_two_subnet_architecture_resource_order() {
        let network = NetworkStackBuilder::new("test")
            .with_private_network("main", 2, "10.0.0.0/16", &Tags::new())
            .build();

        let kinds: Vec<_> = network
            .network_resources()
            .iter()
            .map(resource_type)
            .collect();
        assert_eq!(
            kinds,
            ["vpc", "subnet", "subnet", "internet_gateway", "route_table"]
        );
        assert_eq!(network.subnet_names(), ["main_private_1", "main_private_2"]);
    }

    #[test]
    fn test_dynamic_subnet_layout() {
        let network = NetworkStackBuilder::new("test")
            .with_private_network("wide", 4, "10.0.0.0/16", &Tags::new())
            .build();

        assert_eq!(network.subnet_names().len(), 4);
        // vpc + igw + 4 subnets + route table
        assert_eq!(network.network_resources().len(), 7);
    }

    #[test]
    fn test_subnets_depend_on_their_vpc() {
        let subnet =
            NetworkFactory::subnet("app_1", "app", "10.0.1.0/24", "us-east-1a", true, &Tags::new());
        assert_eq!(subnet.dependencies(), ["app".to_string()]);
    }

    #[test]
    fn test_network_rbac_follows_each_vpc() {
        let mut network = NetworkInfrastructure::new("rbac");
        network.two_subnet_architecture("main", "10.0.0.0/16", &Tags::new());

        // network policy + network admin role
        assert_eq!(network.identity().resource_count(), 2);
    }

    #[test]
    fn test_export_appends_rbac_after_network_resources() {
        let mut network = NetworkInfrastructure::new("full");
        network.two_subnet_architecture("main", "10.0.0.0/16", &Tags::new());

        let document = network.export().unwrap();
        assert_eq!(document.len(), 5 + 2);
        assert_eq!(resource_type(&document.resources[0]), "vpc");
        assert_eq!(resource_type(&document.resources[5]), "iam_policy");
    }
}
