//! Composite resource trees
//!
//! Resources form an ownership tree: leaves carry one opaque payload each,
//! composites group leaves and other composites. Adding a child moves it
//! into the parent, so a node belongs to exactly one parent for its whole
//! life and exports stay deterministic.

use crate::document::ExportedDocument;
use serde_json::Value;
use std::collections::BTreeSet;

/// A single infrastructure resource: an opaque payload plus the names of the
/// resources it depends on.
///
/// The dependency names are free-form annotations consumed by downstream
/// policy validators; the container's type-level graph does not read them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    name: String,
    payload: Value,
    dependencies: Vec<String>,
}

impl ResourceNode {
    /// Create a resource node. The payload is built once up front and never
    /// regenerated, which keeps repeated exports byte-identical.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            dependencies: Vec::new(),
        }
    }

    /// Declare a dependency on another named resource
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Declare dependencies on several named resources
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// The resource's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The opaque resource payload
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Names of the resources this one depends on
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// A child slot in a composite: either a leaf resource or a nested composite
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentNode {
    /// A single resource
    Resource(ResourceNode),
    /// A nested grouping
    Composite(CompositeNode),
}

impl ComponentNode {
    /// Export this component's payloads in order
    pub fn export(&self) -> Vec<Value> {
        match self {
            ComponentNode::Resource(leaf) => vec![leaf.payload.clone()],
            ComponentNode::Composite(composite) => composite.export(),
        }
    }
}

impl From<ResourceNode> for ComponentNode {
    fn from(node: ResourceNode) -> Self {
        ComponentNode::Resource(node)
    }
}

impl From<CompositeNode> for ComponentNode {
    fn from(node: CompositeNode) -> Self {
        ComponentNode::Composite(node)
    }
}

/// A named grouping of resources and nested composites
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeNode {
    name: String,
    children: Vec<ComponentNode>,
}

impl CompositeNode {
    /// Create an empty composite
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// The composite's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Move a child into this composite
    pub fn add(&mut self, child: impl Into<ComponentNode>) -> &mut Self {
        self.children.push(child.into());
        self
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether the composite has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Flatten the tree into payloads, depth first in child-insertion order.
    ///
    /// Repeated calls with no intervening mutation yield identical output.
    pub fn export(&self) -> Vec<Value> {
        let mut resources = Vec::new();
        self.collect(&mut resources);
        resources
    }

    fn collect(&self, out: &mut Vec<Value>) {
        for child in &self.children {
            match child {
                ComponentNode::Resource(leaf) => out.push(leaf.payload().clone()),
                ComponentNode::Composite(nested) => nested.collect(out),
            }
        }
    }

    /// Export the tree as a document
    pub fn export_document(&self) -> ExportedDocument {
        ExportedDocument::from_resources(self.export())
    }

    /// Union of all descendant dependency names, deduplicated and sorted
    pub fn dependencies(&self) -> Vec<String> {
        let mut set = BTreeSet::new();
        self.collect_dependencies(&mut set);
        set.into_iter().collect()
    }

    fn collect_dependencies(&self, out: &mut BTreeSet<String>) {
        for child in &self.children {
            match child {
                ComponentNode::Resource(leaf) => {
                    out.extend(leaf.dependencies().iter().cloned());
                }
                ComponentNode::Composite(nested) => nested.collect_dependencies(out),
            }
        }
    }
}
