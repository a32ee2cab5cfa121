//! Rendering of forest subtrees as `termtree` trees.

use std::fmt;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::Forest;
use crate::domain::entities::TreeEntity;

pub trait TreeNodeConvert {
    /// Render the subtree below `root`, labelling nodes with `label`.
    fn to_tree_with<F>(&self, root: Index, label: &F) -> Tree<String>
    where
        F: Fn(Index) -> String;

    /// Render the subtree below `root` using the entities' `Display`.
    fn to_tree_string(&self, root: Index) -> Tree<String>;
}

impl<E: TreeEntity + fmt::Display> TreeNodeConvert for Forest<E> {
    #[instrument(level = "trace", skip(self, label))]
    fn to_tree_with<F>(&self, root: Index, label: &F) -> Tree<String>
    where
        F: Fn(Index) -> String,
    {
        let leaves: Vec<_> = self
            .get(root)
            .map(|node| node.children())
            .unwrap_or_default()
            .iter()
            .map(|&child| self.to_tree_with(child, label))
            .collect();

        Tree::new(label(root)).with_leaves(leaves)
    }

    fn to_tree_string(&self, root: Index) -> Tree<String> {
        self.to_tree_with(root, &|idx| {
            self.entity(idx)
                .map(|e| e.to_string())
                .unwrap_or_else(|| "<missing>".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{rebuild_forest, Record};

    #[test]
    fn given_rebuilt_forest_when_rendering_then_children_in_order() {
        let (mut forest, _) = Forest::from_entities(vec![
            Record::new("a", None, 1).with_name("Root"),
            Record::new("b", Some("a"), 2),
            Record::new("c", Some("a"), 1),
        ])
        .unwrap();
        let all = forest.indices().to_vec();
        let roots = rebuild_forest(&mut forest, &all).unwrap();

        let rendered = forest.to_tree_string(roots[0]).to_string();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Root [a]");
        assert!(lines[1].ends_with('c'));
        assert!(lines[2].ends_with('b'));
    }
}
