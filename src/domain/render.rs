//! Text tree rendering of graph snapshots

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::{GraphArena, ObjectData};

pub trait GraphRender {
    fn to_tree_string(&self) -> Tree<String>;
}

impl GraphRender for GraphArena {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let Some(root_idx) = self.root() else {
            return Tree::new("Empty graph".to_string());
        };
        let Some(root) = self.get_node(root_idx) else {
            return Tree::new("Empty graph".to_string());
        };

        fn build_tree(graph: &GraphArena, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = graph.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = graph.get_node(child_idx) {
                        let mut child_tree = Tree::new(child.data.to_string());
                        build_tree(graph, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
                for &alias_idx in &node.aliases {
                    if let Some(target) = graph.get_node(alias_idx) {
                        parent_tree.push(Tree::new(format!("-> {}", alias_label(&target.data))));
                    }
                }
            }
        }

        let mut tree = Tree::new(root.data.to_string());
        build_tree(self, root_idx, &mut tree);
        tree
    }
}

/// Short label for an alias edge: kind and ordinal, no contents.
fn alias_label(data: &ObjectData) -> String {
    match data.ordinal {
        Some(n) => format!("{}#{}", data.kind.name(), n),
        None => data.kind.name().to_string(),
    }
}
