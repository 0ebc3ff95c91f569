//! Resource hierarchy - the static nesting tree of controllable resources.
//!
//! Translates "a claim on resource R" into "implied claims on every leaf
//! beneath R". Built once from the tree published by the authoritative lease
//! service and never mutated; resource names are unique across the tree.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One node of the resource nesting tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHierarchy {
    resource: String,
    children: Vec<ResourceHierarchy>,
}

impl ResourceHierarchy {
    pub fn new(resource: impl Into<String>, children: Vec<ResourceHierarchy>) -> Self {
        Self {
            resource: resource.into(),
            children,
        }
    }

    /// A node with no sub-resources.
    pub fn leaf(resource: impl Into<String>) -> Self {
        Self::new(resource, Vec::new())
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn children(&self) -> &[ResourceHierarchy] {
        &self.children
    }

    pub fn has_sub_resources(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether `name` is this node or any descendant.
    pub fn has_resource(&self, name: &str) -> bool {
        self.get_hierarchy(name).is_some()
    }

    /// The subtree rooted at `name`, if it exists under this node.
    pub fn get_hierarchy(&self, name: &str) -> Option<&ResourceHierarchy> {
        if self.resource == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.get_hierarchy(name))
    }

    /// Every leaf resource reachable from this node.
    ///
    /// Returned as an ordered set so callers that fold over the leaves visit
    /// them in a deterministic (lexicographic) order.
    pub fn leaf_resources(&self) -> BTreeSet<String> {
        let mut leaves = BTreeSet::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(&self, leaves: &mut BTreeSet<String>) {
        if self.children.is_empty() {
            leaves.insert(self.resource.clone());
            return;
        }
        for child in &self.children {
            child.collect_leaves(leaves);
        }
    }
}
