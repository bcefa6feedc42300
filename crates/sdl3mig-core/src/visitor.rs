//! Pre-order traversal over a `SyntaxTree`
//!
//! Rules and the dispatch driver implement `visit_node`; the default
//! traversal walks children in source order.

use crate::tree::{NodeId, SyntaxTree};

/// Trait for visiting syntax tree nodes
pub trait Visitor {
    /// Called for each node before its children. Return `true` to continue
    /// traversal into children.
    fn visit_node(&mut self, _tree: &SyntaxTree<'_>, _id: NodeId) -> bool {
        true
    }

    /// Visit a whole tree (entry point)
    fn visit_tree(&mut self, tree: &SyntaxTree<'_>) {
        self.traverse(tree, tree.root());
    }

    /// Traverse a node and its descendants in pre-order.
    ///
    /// Uses an explicit stack so deeply nested expressions cannot exhaust
    /// the call stack.
    fn traverse(&mut self, tree: &SyntaxTree<'_>, start: NodeId) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !self.visit_node(tree, id) {
                continue;
            }
            stack.extend(tree.children(id).iter().rev().copied());
        }
    }
}

/// Helper function to run a visitor on a tree
pub fn visit<V: Visitor>(visitor: &mut V, tree: &SyntaxTree<'_>) {
    visitor.visit_tree(tree);
}
