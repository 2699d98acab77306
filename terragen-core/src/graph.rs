//! Dependency graph and resolution ordering

use crate::error::{ContainerError, Result};
use rustc_hash::{FxHashMap, FxHashSet};

/// Directed dependency graph over registered type names.
///
/// Edges point from a type to the types it depends on. Dependency names that
/// are never registered stay in the edge lists and are skipped while
/// computing the resolution order; their existence is checked at resolve
/// time instead.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// type name -> the types it depends on, in declaration order
    dependencies: FxHashMap<String, Vec<String>>,
    /// Reverse index: type name -> the types that depend on it
    dependents: FxHashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the dependency list for a node, replacing any previous list.
    pub fn set_dependencies(&mut self, node: impl Into<String>, dependencies: Vec<String>) {
        let node = node.into();

        if let Some(previous) = self.dependencies.remove(&node) {
            for dep in previous {
                if let Some(list) = self.dependents.get_mut(&dep) {
                    list.retain(|d| d != &node);
                }
            }
        }

        for dep in &dependencies {
            self.dependents
                .entry(dep.clone())
                .or_default()
                .push(node.clone());
        }

        self.dependencies.insert(node, dependencies);
    }

    /// Dependencies declared for a node (empty for unknown nodes)
    pub fn dependencies_of(&self, node: &str) -> &[String] {
        self.dependencies
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Types that declared a dependency on `node`
    pub fn dependents_of(&self, node: &str) -> &[String] {
        self.dependents
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether `node` has a recorded dependency list
    pub fn contains(&self, node: &str) -> bool {
        self.dependencies.contains_key(node)
    }

    /// Number of nodes with recorded dependency lists
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Registered nodes in sorted order
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<_> = self.dependencies.keys().cloned().collect();
        nodes.sort();
        nodes
    }

    /// Iterate over nodes and their dependency lists
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.dependencies.iter()
    }

    /// Compute an order in which every dependency precedes its dependents.
    ///
    /// Depth-first post-order with roots visited in sorted order, so the
    /// result is stable for a given edge set no matter the registration
    /// sequence. On a cycle the full offending chain is returned and no
    /// partial order escapes.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let mut sorted = Vec::with_capacity(self.dependencies.len());
        let mut visited = FxHashSet::default();
        let mut in_progress = FxHashSet::default();
        let mut path = Vec::new();

        for node in self.nodes() {
            if !visited.contains(&node) {
                self.visit(&node, &mut visited, &mut in_progress, &mut path, &mut sorted)?;
            }
        }

        Ok(sorted)
    }

    fn visit(
        &self,
        node: &str,
        visited: &mut FxHashSet<String>,
        in_progress: &mut FxHashSet<String>,
        path: &mut Vec<String>,
        sorted: &mut Vec<String>,
    ) -> Result<()> {
        in_progress.insert(node.to_string());
        path.push(node.to_string());

        for dep in self.dependencies_of(node) {
            if in_progress.contains(dep) {
                let mut cycle = path.clone();
                cycle.push(dep.clone());
                return Err(ContainerError::CircularDependency { path: cycle });
            }
            // Names without a registration are externally satisfied.
            if !visited.contains(dep) && self.dependencies.contains_key(dep) {
                self.visit(dep, visited, in_progress, path, sorted)?;
            }
        }

        in_progress.remove(node);
        path.pop();
        visited.insert(node.to_string());
        sorted.push(node.to_string());
        Ok(())
    }
}
