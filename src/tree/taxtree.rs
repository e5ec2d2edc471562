//! Rooted, labeled taxonomy tree built from identifier paths

use std::collections::HashMap;
use std::fmt;
use super::store::{Node, NodeStore};
use crate::{Result, TaxoTreeError};

/// Identifier reserved for the root node
pub const ROOT_ID: &str = "root";

/// A taxonomy tree with a scalar payload on every node
///
/// - The root is always [`ROOT_ID`]
/// - Children keep their creation order, which fixes every traversal order
/// - Nodes only come from path ingestion or explicit creation, and only
///   leave through [`TaxTree::remove_levels`]
#[derive(Clone, PartialEq)]
pub struct TaxTree {
    pub(super) store: NodeStore,
}

impl TaxTree {
    /// Create a tree holding only the root, with payload 0
    pub fn new() -> Self {
        TaxTree {
            store: NodeStore::with_root(ROOT_ID, 0.0),
        }
    }

    /// Build a tree from a list of paths
    pub fn from_path_list<I, P, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut tree = TaxTree::new();
        tree.from_paths(paths)?;
        Ok(tree)
    }

    /// Wrap an existing store after checking its structure
    pub(crate) fn from_store(store: NodeStore) -> std::result::Result<Self, String> {
        store.validate()?;
        match store.root() {
            Some(ROOT_ID) => Ok(TaxTree { store }),
            Some(other) => Err(format!("root must be {:?}, found {:?}", ROOT_ID, other)),
            None => Err("tree has no root".to_string()),
        }
    }

    /// Underlying node store
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Root identifier
    pub fn root(&self) -> &str {
        ROOT_ID
    }

    /// Number of nodes, root included
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Check whether an identifier is in the tree
    pub fn contains(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    /// Get a node
    pub fn get(&self, id: &str) -> Result<&Node> {
        self.store.get(id)
    }

    /// Payload of a node
    pub fn data(&self, id: &str) -> Result<f64> {
        self.store.data(id)
    }

    /// Overwrite the payload of a node
    pub fn set_data(&mut self, id: &str, value: f64) -> Result<()> {
        self.store.set_data(id, value)
    }

    /// Children of a node in creation order
    pub fn children(&self, id: &str) -> Result<&[String]> {
        self.store.get(id).map(Node::children)
    }

    /// Parent of a node (None for the root)
    pub fn parent(&self, id: &str) -> Result<Option<&str>> {
        self.store.parent(id)
    }

    /// Create a node under an existing parent with payload 0
    pub fn create_node(&mut self, id: impl Into<String>, parent: &str) -> Result<()> {
        self.store.create(id, Some(parent), 0.0)
    }

    /// Extend the tree with paths of identifiers.
    ///
    /// Each path is walked from the root; identifiers that are not yet
    /// children of the current node are created with payload 0, shared
    /// prefixes are reused. A leading [`ROOT_ID`] is skipped so paths from
    /// [`TaxTree::dfs_nodes`] can be fed back in.
    ///
    /// All paths are checked before the tree is touched: on error nothing is
    /// created. Returns the number of new nodes.
    pub fn from_paths<I, P, S>(&mut self, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        // Plan first, in creation order, then apply
        let mut planned: HashMap<String, String> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut n_paths = 0usize;

        for path in paths {
            let path = path.as_ref();
            n_paths += 1;
            if path.is_empty() {
                return Err(TaxoTreeError::MalformedPath("empty path".to_string()));
            }

            let labels = match path[0].as_ref() {
                ROOT_ID => &path[1..],
                _ => path,
            };

            let mut current = ROOT_ID.to_string();
            for label in labels {
                let label = label.as_ref();
                if label.is_empty() {
                    return Err(TaxoTreeError::MalformedPath(format!(
                        "empty identifier below {}",
                        current
                    )));
                }

                let existing_parent = match self.store.parent(label) {
                    Ok(parent) => Some(parent.unwrap_or(ROOT_ID)),
                    Err(_) => planned.get(label).map(String::as_str),
                };

                match existing_parent {
                    Some(parent) if parent == current && label != ROOT_ID => {}
                    Some(_) => {
                        return Err(TaxoTreeError::DuplicateIdentifier(label.to_string()));
                    }
                    None => {
                        planned.insert(label.to_string(), current.clone());
                        order.push(label.to_string());
                    }
                }
                current = label.to_string();
            }
        }

        for id in &order {
            let parent = &planned[id];
            log::trace!("creating {} under {}", id, parent);
            self.store.create(id.as_str(), Some(parent.as_str()), 0.0)?;
        }

        log::debug!(
            "ingested {} paths, created {} nodes (tree size {})",
            n_paths,
            order.len(),
            self.size()
        );
        Ok(order.len())
    }

    /// Identifiers from the root down to `id`, inclusive
    pub fn path_to_node(&self, id: &str) -> Result<Vec<String>> {
        let mut path = vec![id.to_string()];
        let mut current = self.store.parent(id)?;
        while let Some(parent) = current {
            path.push(parent.to_string());
            current = self.store.parent(parent)?;
        }
        path.reverse();
        Ok(path)
    }

    /// Edge distance of a node from the root
    pub fn level(&self, id: &str) -> Result<usize> {
        self.path_to_node(id).map(|path| path.len() - 1)
    }

    /// Length of the longest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        self.breadth_first()
            .last()
            .map(|&(_, level)| level)
            .unwrap_or(0)
    }

    /// Leaf identifiers in pre-order
    pub fn leaves(&self) -> Vec<String> {
        self.preorder()
            .into_iter()
            .filter(|id| self.store.children(id).is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Count of leaf nodes
    pub fn leaf_count(&self) -> usize {
        self.store.nodes().filter(|node| node.is_leaf()).count()
    }

    /// Identifiers at a given level in breadth-first order
    pub fn nodes_at_level(&self, level: usize) -> Vec<String> {
        self.breadth_first()
            .into_iter()
            .filter(|&(_, l)| l == level)
            .map(|(id, _)| id.to_string())
            .collect()
    }
}

impl Default for TaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TaxTree {
    fn fmt_recursive(&self, f: &mut fmt::Formatter<'_>, id: &str, indent: usize) -> fmt::Result {
        for _ in 0..indent {
            write!(f, "  ")?;
        }
        let data = self.store.data(id).map_err(|_| fmt::Error)?;
        writeln!(f, "● {} ({})", id, data)?;

        for child in self.store.children(id) {
            self.fmt_recursive(f, child, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TaxTree(size={})", self.size())?;
        self.fmt_recursive(f, ROOT_ID, 0)
    }
}
