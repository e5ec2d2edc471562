//! Identifier-indexed storage of tree nodes

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use crate::{Result, TaxoTreeError};

/// A single node of a taxonomy tree
///
/// Parent and children are identifiers resolved through the owning
/// [`NodeStore`]; a node never holds a reference to another node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    identifier: String,
    parent: Option<String>,
    /// Children in creation order
    children: Vec<String>,
    data: f64,
}

impl Node {
    fn new(identifier: String, parent: Option<String>, data: f64) -> Self {
        Node {
            identifier,
            parent,
            children: Vec::new(),
            data,
        }
    }

    /// Identifier of this node
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Identifier of the parent (None for the root)
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Children identifiers in creation order
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Payload value
    pub fn data(&self) -> f64 {
        self.data
    }

    /// Overwrite the payload
    pub fn set_data(&mut self, value: f64) {
        self.data = value;
    }

    /// Check whether this node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Owner of every node in a tree
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStore {
    nodes: BTreeMap<String, Node>,
    root: Option<String>,
}

impl NodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding only a root node
    pub fn with_root(id: impl Into<String>, data: f64) -> Self {
        let id = id.into();
        let mut nodes = BTreeMap::new();
        nodes.insert(id.clone(), Node::new(id.clone(), None, data));
        NodeStore {
            nodes,
            root: Some(id),
        }
    }

    /// Register a new node.
    ///
    /// With `parent == None` the node becomes the root, which is only allowed
    /// while the store is empty. Otherwise the node is appended to the
    /// parent's children.
    pub fn create(&mut self, id: impl Into<String>, parent: Option<&str>, data: f64) -> Result<()> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(TaxoTreeError::DuplicateIdentifier(id));
        }

        match parent {
            None => {
                if let Some(root) = &self.root {
                    return Err(TaxoTreeError::MalformedPath(format!(
                        "cannot add second root {} (root is {})",
                        id, root
                    )));
                }
                self.root = Some(id.clone());
                self.nodes.insert(id.clone(), Node::new(id, None, data));
            }
            Some(parent) => {
                let parent_node = self
                    .nodes
                    .get_mut(parent)
                    .ok_or_else(|| TaxoTreeError::UnknownParent(parent.to_string()))?;
                parent_node.children.push(id.clone());
                self.nodes
                    .insert(id.clone(), Node::new(id, Some(parent.to_string()), data));
            }
        }

        Ok(())
    }

    /// Get a node
    pub fn get(&self, id: &str) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| TaxoTreeError::UnknownNode(id.to_string()))
    }

    /// Get a node's payload
    pub fn data(&self, id: &str) -> Result<f64> {
        self.get(id).map(Node::data)
    }

    /// Get a node for payload updates
    pub fn get_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TaxoTreeError::UnknownNode(id.to_string()))
    }

    /// Overwrite a node's payload
    pub fn set_data(&mut self, id: &str, value: f64) -> Result<()> {
        self.get_mut(id)?.set_data(value);
        Ok(())
    }

    /// Detach a node from its parent and delete it.
    ///
    /// The node must not have children left.
    pub fn remove(&mut self, id: &str) -> Result<Node> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| TaxoTreeError::UnknownNode(id.to_string()))?;
        debug_assert!(node.children.is_empty(), "removed {} with live children", id);

        match node.parent.as_deref() {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.children.retain(|child| child != id);
                }
            }
            None => self.root = None,
        }

        Ok(node)
    }

    /// Children of a node (empty for unknown identifiers)
    pub fn children(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Parent of a node
    pub fn parent(&self, id: &str) -> Result<Option<&str>> {
        self.get(id).map(Node::parent)
    }

    /// Root identifier, if any
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Check whether an identifier is present
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All identifiers, sorted
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Iterate over all nodes, sorted by identifier
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Check that links are mutually consistent and every node hangs off the
    /// root exactly once.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let root = match &self.root {
            Some(root) => root,
            None if self.nodes.is_empty() => return Ok(()),
            None => return Err("store has nodes but no root".to_string()),
        };

        let root_node = self.nodes.get(root).ok_or("root identifier is not stored")?;
        if root_node.parent.is_some() {
            return Err(format!("root {} has a parent", root));
        }

        let mut seen = 0usize;
        let mut stack = vec![root.as_str()];
        let mut visited = std::collections::HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                return Err(format!("node {} is reachable twice", id));
            }
            seen += 1;
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| format!("dangling child reference {}", id))?;
            for child in &node.children {
                let child_node = self
                    .nodes
                    .get(child)
                    .ok_or_else(|| format!("dangling child reference {}", child))?;
                if child_node.parent.as_deref() != Some(id) {
                    return Err(format!("child {} does not point back to {}", child, id));
                }
                stack.push(child.as_str());
            }
        }

        if seen != self.nodes.len() {
            return Err(format!(
                "{} nodes unreachable from root",
                self.nodes.len() - seen
            ));
        }
        Ok(())
    }
}
