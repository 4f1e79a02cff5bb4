//! Final checks before code generation.
//!
//! After lowering, every reachable node must be a typed scalar of a kind the
//! emitter has an instruction for. Anything else means an earlier pass left
//! work undone (or a custom pass introduced it) and is reported here rather
//! than as a confusing emitter error.

use exprc_core::{Ast, CompileError, NodeId, NodeKind};

use crate::bytecode::OpCode;
use crate::emit::select_opcode;

/// Pre-order transform that never rewrites, only rejects.
pub fn validate(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    let node = ast.node(id);
    if !node.return_type.is_known() {
        return Err(CompileError::type_error(ast.describe(id), "type is unknown"));
    }
    if node.return_type.is_vector() {
        return Err(CompileError::validation(
            ast.describe(id),
            format!("vector type {} was not scalarized", node.return_type),
        ));
    }

    let problem = match &node.kind {
        NodeKind::Constructor { .. } | NodeKind::Swizzle { .. } => Some("vector construct was not scalarized"),
        NodeKind::Unary { op, .. } if op.is_vector_op() => Some("vector operator was not replaced"),
        NodeKind::Binary { op, .. } if op.is_vector_op() => Some("vector operator was not replaced"),
        NodeKind::FunctionCall { .. } if node.selected_function().is_none() => Some("no overload selected"),
        NodeKind::Output { desc, .. } if desc.data_type.is_vector() => Some("vector output was not scalarized"),
        _ => None,
    };

    if let Some(message) = problem {
        return Err(CompileError::validation(ast.describe(id), message));
    }

    if select_opcode(ast, id) == OpCode::Nop {
        return Err(CompileError::validation(
            ast.describe(id),
            format!("no instruction for this operation on {}", node.register_type().name()),
        ));
    }
    Ok(id)
}
