//! Payload assignment, bottom-up aggregation and level pruning

use std::collections::HashMap;
use super::taxtree::TaxTree;
use crate::{Result, TaxoTreeError};

impl TaxTree {
    /// Set every node's payload to `value`, in pre-order.
    ///
    /// Use this to reset the tree before a new aggregation epoch.
    pub fn init_nodes_data(&mut self, value: f64) {
        let ids: Vec<String> = self.preorder().into_iter().map(str::to_string).collect();
        for id in ids {
            if let Err(e) = self.store.set_data(&id, value) {
                log::warn!("skipping payload reset: {}", e);
            }
        }
    }

    /// Assign payloads from `(identifier, value)` pairs.
    ///
    /// All-or-nothing: every identifier is checked before anything is
    /// written, and the first unknown one fails with
    /// [`TaxoTreeError::UnknownNode`].
    pub fn fill_with<I, K>(&mut self, mapping: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mapping: Vec<(K, f64)> = mapping.into_iter().collect();
        if let Some((missing, _)) = mapping.iter().find(|(id, _)| !self.contains(id.as_ref())) {
            return Err(TaxoTreeError::UnknownNode(missing.as_ref().to_string()));
        }

        for (id, value) in &mapping {
            self.store.set_data(id.as_ref(), *value)?;
        }
        Ok(())
    }

    /// Add to every node the sum of its children's payloads, bottom-up.
    ///
    /// Nodes are visited in reverse breadth-first order, so children already
    /// hold their aggregated value when their parent is updated. This is a
    /// one-shot operation per epoch: running it twice counts every leaf
    /// again. Reset with [`TaxTree::init_nodes_data`] and refill first.
    pub fn update_value(&mut self) {
        let order: Vec<String> = self
            .breadth_first()
            .into_iter()
            .rev()
            .map(|(id, _)| id.to_string())
            .collect();

        for id in order {
            let children_sum: f64 = self
                .store
                .children(&id)
                .iter()
                .filter_map(|child| self.store.data(child).ok())
                .sum();
            if let Ok(own) = self.store.data(&id) {
                if let Err(e) = self.store.set_data(&id, own + children_sum) {
                    log::warn!("skipping aggregation: {}", e);
                }
            }
        }
    }

    /// Remove every node whose level is `>= level`.
    ///
    /// Nodes go in reverse pre-order, so a node is only removed once all of
    /// its descendants are gone. Level 0 would remove the root and is
    /// rejected. Returns the number of removed nodes.
    pub fn remove_levels(&mut self, level: usize) -> Result<usize> {
        if level == 0 {
            return Err(TaxoTreeError::MalformedPath(
                "cannot prune level 0: the root must stay".to_string(),
            ));
        }

        let levels: HashMap<String, usize> = self
            .breadth_first()
            .into_iter()
            .map(|(id, l)| (id.to_string(), l))
            .collect();
        let doomed: Vec<String> = self
            .preorder()
            .into_iter()
            .rev()
            .filter(|id| levels.get(*id).is_some_and(|&l| l >= level))
            .map(str::to_string)
            .collect();

        for id in &doomed {
            self.store.remove(id)?;
        }

        log::debug!(
            "pruned {} nodes at level >= {} (depth now {})",
            doomed.len(),
            level,
            self.depth()
        );
        Ok(doomed.len())
    }

    /// Sum of the leaf payloads below (and including) a node
    pub fn subtree_leaf_sum(&self, id: &str) -> Result<f64> {
        let node = self.store.get(id)?;
        if node.is_leaf() {
            return Ok(node.data());
        }
        node.children()
            .iter()
            .map(|child| self.subtree_leaf_sum(child))
            .sum()
    }
}
