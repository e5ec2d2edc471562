//! Breadth-first and root-to-leaf traversals
//!
//! Both orders expand children in creation order, so two trees built from
//! the same paths in the same order always traverse identically.

use std::collections::{BTreeMap, VecDeque};
use super::taxtree::{TaxTree, ROOT_ID};

impl TaxTree {
    /// Every identifier in pre-order (parent before children, left to right)
    pub fn preorder(&self) -> Vec<&str> {
        let mut order = Vec::with_capacity(self.size());
        let mut stack = vec![ROOT_ID];

        while let Some(id) = stack.pop() {
            order.push(id);
            // Reverse so the first child is popped first
            for child in self.store.children(id).iter().rev() {
                stack.push(child.as_str());
            }
        }

        order
    }

    /// Every identifier in breadth-first order, paired with its level
    pub fn breadth_first(&self) -> Vec<(&str, usize)> {
        let mut order = Vec::with_capacity(self.size());
        let mut queue = VecDeque::new();
        queue.push_back((ROOT_ID, 0));

        while let Some((id, level)) = queue.pop_front() {
            order.push((id, level));
            for child in self.store.children(id) {
                queue.push_back((child.as_str(), level + 1));
            }
        }

        order
    }

    /// Identifiers grouped by level, for levels `0..=depth()`
    pub fn bfs_nodes(&self) -> BTreeMap<usize, Vec<String>> {
        let mut levels: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (id, level) in self.breadth_first() {
            levels.entry(level).or_default().push(id.to_string());
        }
        levels
    }

    /// Payloads grouped by level, aligned with [`TaxTree::bfs_nodes`]
    pub fn bfs_data(&self) -> BTreeMap<usize, Vec<f64>> {
        let mut levels: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for (id, level) in self.breadth_first() {
            levels.entry(level).or_default().push(self.payload(id));
        }
        levels
    }

    /// All root-to-leaf paths, one per leaf, in pre-order
    pub fn dfs_nodes(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        let mut current = vec![ROOT_ID];
        self.dfs_paths(ROOT_ID, &mut current, &mut paths);
        paths
    }

    /// Payloads along every root-to-leaf path, aligned with [`TaxTree::dfs_nodes`]
    pub fn dfs_data(&self) -> Vec<Vec<f64>> {
        self.dfs_nodes()
            .iter()
            .map(|path| path.iter().map(|id| self.payload(id)).collect())
            .collect()
    }

    fn dfs_paths<'a>(&'a self, id: &'a str, current: &mut Vec<&'a str>, paths: &mut Vec<Vec<String>>) {
        let children = self.store.children(id);
        if children.is_empty() {
            paths.push(current.iter().map(|s| s.to_string()).collect());
        } else {
            for child in children {
                current.push(child);
                self.dfs_paths(child, current, paths);
                current.pop();
            }
        }
    }

    /// Payload of an identifier obtained from a traversal of this tree
    fn payload(&self, id: &str) -> f64 {
        self.store.get(id).map(|node| node.data()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TaxTree {
        let mut tree = TaxTree::from_path_list(vec![
            vec!["A", "A1", "A1x"],
            vec!["A", "A2"],
            vec!["B"],
            vec!["C", "C1"],
        ])
        .unwrap();
        tree.fill_with(vec![("A1x", 1.0), ("A2", 2.0), ("B", 3.0), ("C1", 4.0)])
            .unwrap();
        tree
    }

    #[test]
    fn test_preorder() {
        let tree = sample_tree();
        assert_eq!(
            tree.preorder(),
            vec!["root", "A", "A1", "A1x", "A2", "B", "C", "C1"]
        );
    }

    #[test]
    fn test_bfs_nodes() {
        let tree = sample_tree();
        let levels = tree.bfs_nodes();
        assert_eq!(levels.len(), tree.depth() + 1);
        assert_eq!(levels[&0], vec!["root"]);
        assert_eq!(levels[&1], vec!["A", "B", "C"]);
        assert_eq!(levels[&2], vec!["A1", "A2", "C1"]);
        assert_eq!(levels[&3], vec!["A1x"]);

        let total: usize = levels.values().map(Vec::len).sum();
        assert_eq!(total, tree.size());
    }

    #[test]
    fn test_bfs_data() {
        let tree = sample_tree();
        let data = tree.bfs_data();
        assert_eq!(data[&1], vec![0.0, 3.0, 0.0]);
        assert_eq!(data[&2], vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_dfs_nodes_and_data() {
        let tree = sample_tree();
        let paths = tree.dfs_nodes();
        assert_eq!(
            paths,
            vec![
                vec!["root", "A", "A1", "A1x"],
                vec!["root", "A", "A2"],
                vec!["root", "B"],
                vec!["root", "C", "C1"],
            ]
        );
        for path in &paths {
            let last = path.last().unwrap();
            assert!(tree.children(last).unwrap().is_empty());
        }

        let data = tree.dfs_data();
        assert_eq!(data[0], vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(data[2], vec![0.0, 3.0]);
    }

    #[test]
    fn test_scenario_dfs_order() {
        let tree = TaxTree::from_path_list(vec![
            vec!["root", "A", "A1"],
            vec!["root", "A", "A2"],
            vec!["root", "B"],
        ])
        .unwrap();
        assert_eq!(
            tree.dfs_nodes(),
            vec![
                vec!["root", "A", "A1"],
                vec!["root", "A", "A2"],
                vec!["root", "B"],
            ]
        );
    }

    #[test]
    fn test_root_only_traversals() {
        let tree = TaxTree::new();
        assert_eq!(tree.dfs_nodes(), vec![vec!["root".to_string()]]);
        assert_eq!(tree.bfs_nodes().len(), 1);
        assert_eq!(tree.dfs_data(), vec![vec![0.0]]);
    }
}
