//! Vector instruction replacement and input/output scalarization.
//!
//! Vector-only operators are first rewritten in terms of operators that
//! apply per component, then vector streams are split into one scalar
//! stream per component (`pos` becomes `pos.x`, `pos.y`, `pos.z`).

use exprc_core::{
    Ast, BinaryOp, COMPONENT_NAMES, CompileError, DataType, Node, NodeId, NodeKind, StreamDesc, UnaryOp,
};
use rustc_hash::FxHashMap;

use super::rewrite_until_stable;

/// Pre-order transform replacing `Length`, `Normalize`, `Cross` and the
/// degenerate scalar forms of `Dot`, `All` and `Any`.
///
/// `any(all(v))` on a scalar collapses in one call.
pub fn replace_vector_instructions(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    rewrite_until_stable(ast, id, replace_vector_instruction)
}

fn replace_vector_instruction(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    let return_type = ast.return_type(id);
    match ast.node(id).kind {
        NodeKind::Unary { op, operand } => {
            let width = ast.return_type(operand).width;
            let replaced = match op {
                UnaryOp::Length if width == 1 => ast.create_unary(UnaryOp::Absolute, operand),
                UnaryOp::Length => length(ast, operand),
                UnaryOp::Normalize => {
                    let magnitude = if width == 1 {
                        ast.create_unary(UnaryOp::Absolute, operand)
                    } else {
                        length(ast, operand)
                    };
                    ast.create_binary(BinaryOp::Divide, operand, magnitude)
                }
                UnaryOp::All | UnaryOp::Any if width == 1 => operand,
                _ => id,
            };
            Ok(replaced)
        }
        NodeKind::Binary { op, operands: [a, b] } => {
            let replaced = match op {
                BinaryOp::Dot if !ast.return_type(a).is_vector() && !ast.return_type(b).is_vector() => {
                    ast.create_binary(BinaryOp::Multiply, a, b)
                }
                BinaryOp::Cross => cross(ast, a, b, return_type),
                _ => id,
            };
            Ok(replaced)
        }
        _ => Ok(id),
    }
}

/// `sqrt(dot(v, v))`
fn length(ast: &mut Ast, v: NodeId) -> NodeId {
    let dot = ast.create_binary(BinaryOp::Dot, v, v);
    ast.create_unary(UnaryOp::Sqrt, dot)
}

/// `(a.y*b.z - a.z*b.y, a.z*b.x - a.x*b.z, a.x*b.y - a.y*b.x)`
fn cross(ast: &mut Ast, a: NodeId, b: NodeId, data_type: DataType) -> NodeId {
    let mut components = Vec::with_capacity(3);
    for (i, j) in [(1, 2), (2, 0), (0, 1)] {
        let a_i = ast.component(a, i);
        let b_j = ast.component(b, j);
        let a_j = ast.component(a, j);
        let b_i = ast.component(b, i);
        let lhs = ast.create_binary(BinaryOp::Multiply, a_i, b_j);
        let rhs = ast.create_binary(BinaryOp::Multiply, a_j, b_i);
        components.push(ast.create_binary(BinaryOp::Subtract, lhs, rhs));
    }
    ast.create_constructor(data_type, components)
}

/// Name of one component of a vector stream, e.g. `pos.y`.
pub fn component_name(name: &str, component: u8) -> String {
    format!("{name}.{}", COMPONENT_NAMES[component as usize & 3])
}

/// Split every vector input into scalar inputs.
///
/// The vector input node is overwritten in place with a constructor of the
/// new scalar inputs, so every reference to it keeps working. The declared
/// input list is updated to the scalar inputs.
pub fn scalarize_inputs(ast: &mut Ast) -> Result<(), CompileError> {
    let declared = ast.inputs().to_vec();
    let mut inputs = Vec::with_capacity(declared.len());
    let mut split: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();

    let ids: Vec<NodeId> = ast.ids().collect();
    for id in ids {
        let NodeKind::Input(desc) = &ast.node(id).kind else {
            continue;
        };
        if !desc.data_type.is_vector() {
            continue;
        }

        let desc = desc.clone();
        let scalars: Vec<NodeId> = (0..desc.data_type.width)
            .map(|c| ast.create_input(StreamDesc::new(component_name(&desc.name, c), desc.data_type.scalar())))
            .collect();
        ast.replace(
            id,
            Node::new(
                NodeKind::Constructor {
                    arguments: scalars.clone(),
                },
                desc.data_type,
            ),
        );
        split.insert(id, scalars);
    }

    for id in declared {
        match split.get(&id) {
            Some(scalars) => inputs.extend_from_slice(scalars),
            None => inputs.push(id),
        }
    }
    ast.set_inputs(inputs);
    Ok(())
}

/// Split every vector output into scalar outputs.
///
/// Each component output reads one component of the original expression.
/// The declared output table is updated the same way.
pub fn scalarize_outputs(ast: &mut Ast) -> Result<(), CompileError> {
    let roots = ast.outputs().to_vec();
    let mut outputs = Vec::with_capacity(roots.len());

    for root in roots {
        let (desc, expression) = match &ast.node(root).kind {
            NodeKind::Output { desc, expression } => (desc.clone(), *expression),
            _ => {
                return Err(CompileError::malformed(format!(
                    "output root {} is not an output node",
                    ast.describe(root)
                )));
            }
        };

        if !desc.data_type.is_vector() {
            outputs.push(root);
            continue;
        }

        for c in 0..desc.data_type.width {
            let component = ast.component(expression, c);
            let scalar = StreamDesc::new(component_name(&desc.name, c), desc.data_type.scalar());
            outputs.push(ast.create_output(scalar, component));
        }
    }
    ast.set_outputs(outputs);

    let declared: Vec<StreamDesc> = ast
        .declared_outputs()
        .iter()
        .flat_map(|desc| {
            let width = if desc.data_type.is_vector() { desc.data_type.width } else { 0 };
            let scalars: Vec<StreamDesc> = (0..width)
                .map(|c| StreamDesc::new(component_name(&desc.name, c), desc.data_type.scalar()))
                .collect();
            if scalars.is_empty() { vec![desc.clone()] } else { scalars }
        })
        .collect();
    ast.set_declared_outputs(declared);
    Ok(())
}
