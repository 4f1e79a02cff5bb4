//! Explicit-stack graph traversal shared by the passes and the scheduler.
//!
//! Expressions can be arbitrarily deep, so nothing here recurses. Shared
//! nodes are visited once.

use exprc_core::{Ast, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Reusable traversal buffers.
///
/// Owned by the compile context and cleared before every use, so repeated
/// compiles don't reallocate.
#[derive(Debug, Default)]
pub struct TraversalState {
    pub(crate) stack: Vec<(NodeId, bool)>,
    pub(crate) visited: FxHashSet<NodeId>,
    pub(crate) order: Vec<NodeId>,
    /// Original node to transformed node.
    pub(crate) memo: FxHashMap<NodeId, NodeId>,
}

impl TraversalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.visited.clear();
        self.order.clear();
        self.memo.clear();
    }
}

/// Depth-first post-order of every node reachable from `roots`.
///
/// `operands` selects which children are followed, left to right. Each
/// reachable node appears exactly once in `state.order`, after all of its
/// followed operands. The order equals a recursive left-first traversal.
pub fn post_order<R, C>(ast: &Ast, roots: R, operands: C, state: &mut TraversalState)
where
    R: IntoIterator<Item = NodeId>,
    C: Fn(&Ast, NodeId) -> &[NodeId],
{
    state.stack.clear();
    state.visited.clear();
    state.order.clear();

    for root in roots {
        if state.visited.contains(&root) {
            continue;
        }
        state.stack.push((root, false));

        while let Some((node, expanded)) = state.stack.pop() {
            if expanded {
                state.order.push(node);
                continue;
            }
            if !state.visited.insert(node) {
                continue;
            }
            state.stack.push((node, true));
            for &child in operands(ast, node).iter().rev() {
                if !state.visited.contains(&child) {
                    state.stack.push((child, false));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exprc_core::{BinaryOp, DataType, StreamDesc};

    #[test]
    fn children_before_parents() {
        let mut ast = Ast::new();
        let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT));
        let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT));
        let mul = ast.create_binary(BinaryOp::Multiply, a, b);
        let add = ast.create_binary(BinaryOp::Add, mul, a);

        let mut state = TraversalState::new();
        post_order(&ast, [add], Ast::children, &mut state);

        assert_eq!(state.order, vec![a, b, mul, add]);
    }

    #[test]
    fn shared_nodes_appear_once() {
        let mut ast = Ast::new();
        let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
        let sq = ast.create_binary(BinaryOp::Multiply, x, x);
        let sum = ast.create_binary(BinaryOp::Add, sq, sq);

        let mut state = TraversalState::new();
        post_order(&ast, [sum, sum], Ast::children, &mut state);

        assert_eq!(state.order, vec![x, sq, sum]);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut ast = Ast::new();
        let mut node = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
        let one = ast.create_constant(1.0f32);
        for _ in 0..100_000 {
            node = ast.create_binary(BinaryOp::Add, node, one);
        }

        let mut state = TraversalState::new();
        post_order(&ast, [node], Ast::children, &mut state);

        assert_eq!(state.order.len(), 100_002);
        assert_eq!(state.order.last(), Some(&node));
    }
}
