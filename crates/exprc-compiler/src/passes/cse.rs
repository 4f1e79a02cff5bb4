//! Common subexpression elimination.
//!
//! Post-order hash-consing: because children are canonicalized before
//! their parents, two nodes are equivalent exactly when their kind,
//! operator, type and child handles are equal. The first node seen with a
//! given key becomes the canonical node and later duplicates are replaced
//! by it. Operands of commutative operators are ordered so `a + b` and
//! `b + a` share one key.
//!
//! Output nodes are never merged; two outputs may read the same value.

use exprc_core::{Ast, BinaryOp, CompileError, DataType, NodeId, NodeKind, RegisterType, TernaryOp, UnaryOp};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Constant(RegisterType, u32),
    Input(String, DataType),
    Unary(UnaryOp, DataType, NodeId),
    Binary(BinaryOp, DataType, [NodeId; 2]),
    Ternary(TernaryOp, DataType, [NodeId; 3]),
    Call(String, DataType, Vec<NodeId>),
    Constructor(DataType, Vec<NodeId>),
    Swizzle(NodeId, [u8; 4], u8),
}

impl NodeKey {
    fn of(ast: &Ast, id: NodeId) -> Option<NodeKey> {
        let node = ast.node(id);
        let data_type = node.return_type;
        let key = match &node.kind {
            NodeKind::Constant(value) => NodeKey::Constant(value.register_type(), value.to_bits()),
            NodeKind::Input(desc) => NodeKey::Input(desc.name.clone(), desc.data_type),
            NodeKind::Output { .. } => return None,
            NodeKind::Unary { op, operand } => NodeKey::Unary(*op, data_type, *operand),
            NodeKind::Binary { op, operands } => {
                let mut operands = *operands;
                if op.is_commutative() {
                    operands.sort_unstable();
                }
                NodeKey::Binary(*op, data_type, operands)
            }
            NodeKind::Ternary { op, operands } => NodeKey::Ternary(*op, data_type, *operands),
            NodeKind::FunctionCall { arguments, .. } => {
                let function = node.selected_function()?;
                NodeKey::Call(function.mangled_name(), data_type, arguments.clone())
            }
            NodeKind::Constructor { arguments } => NodeKey::Constructor(data_type, arguments.clone()),
            NodeKind::Swizzle {
                operand,
                components,
                count,
            } => NodeKey::Swizzle(*operand, *components, *count),
        };
        Some(key)
    }
}

/// Structural hash-consing table.
///
/// Owned by the compile context; [`Cse::clear`] must run before each
/// compile since keys refer to node handles of one AST.
#[derive(Debug, Default)]
pub struct Cse {
    canonical: FxHashMap<NodeKey, NodeId>,
}

impl Cse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.canonical.clear();
    }

    /// Number of distinct nodes seen since the last clear.
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Post-order transform returning the canonical node for `id`.
    pub fn eliminate(&mut self, ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
        let Some(key) = NodeKey::of(ast, id) else {
            return Ok(id);
        };
        Ok(*self.canonical.entry(key).or_insert(id))
    }
}
