//! Scalarization of vector instructions.
//!
//! After input/output scalarization every output reads a single component
//! selection (a one-component [`NodeKind::Swizzle`]). This pre-order pass
//! pushes those selections down the DAG until they reach scalar nodes:
//!
//! - a selection of a constructor becomes the matching argument
//! - a selection of a swizzle becomes a selection of its operand
//! - a selection of a componentwise operator becomes the operator applied
//!   to the selected components of its operands
//!
//! `Dot`, `All` and `Any` over vectors expand to `Add`, `LogicalAnd` and
//! `LogicalOr` chains over the components. Component selections are shared
//! through [`Ast::component`], so a vector node used by several parents
//! still produces one scalar node per component.

use exprc_core::{Ast, BinaryOp, CompileError, NodeId, NodeKind, UnaryOp, Value};

use super::rewrite_until_stable;

/// Pre-order transform replacing vector nodes with scalar equivalents.
///
/// A selection may resolve to another selection (a swizzle of a swizzle),
/// so the rewrite repeats until the node is scalar or can't be split.
pub fn scalarize_vector_instructions(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    rewrite_until_stable(ast, id, scalarize_vector_instruction)
}

fn scalarize_vector_instruction(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    match ast.node(id).kind {
        NodeKind::Swizzle {
            operand,
            components,
            count: 1,
        } => extract_component(ast, id, operand, components[0]),
        NodeKind::Unary { op, operand } if ast.return_type(operand).is_vector() => match op {
            UnaryOp::All => Ok(reduce(ast, operand, BinaryOp::LogicalAnd)),
            UnaryOp::Any => Ok(reduce(ast, operand, BinaryOp::LogicalOr)),
            _ => Ok(id),
        },
        NodeKind::Binary {
            op: BinaryOp::Dot,
            operands: [a, b],
        } => {
            let width = ast.return_type(a).width.max(ast.return_type(b).width);
            let mut sum = None;
            for c in 0..width {
                let a_c = ast.component(a, c);
                let b_c = ast.component(b, c);
                let product = ast.create_binary(BinaryOp::Multiply, a_c, b_c);
                sum = Some(match sum {
                    Some(total) => ast.create_binary(BinaryOp::Add, total, product),
                    None => product,
                });
            }
            Ok(sum.unwrap_or(id))
        }
        _ => Ok(id),
    }
}

/// Fold all components of `vector` with `op`, left to right.
fn reduce(ast: &mut Ast, vector: NodeId, op: BinaryOp) -> NodeId {
    let width = ast.return_type(vector).width;
    let mut result = ast.component(vector, 0);
    for c in 1..width {
        let next = ast.component(vector, c);
        result = ast.create_binary(op, result, next);
    }
    result
}

/// The scalar node for component `c` of `vector`.
///
/// `selection` is the swizzle node being replaced; it is returned when the
/// vector can't be split further, which leaves it for validation to report.
fn extract_component(ast: &mut Ast, selection: NodeId, vector: NodeId, c: u8) -> Result<NodeId, CompileError> {
    let data_type = ast.return_type(vector);
    if !data_type.is_vector() {
        return Ok(vector);
    }

    let node = ast.node(vector).clone();
    let scalar = match node.kind {
        NodeKind::Constructor { arguments } => {
            if let [single] = arguments[..]
                && !ast.return_type(single).is_vector()
            {
                return Ok(single);
            }
            let mut offset = 0u8;
            for argument in arguments {
                let width = ast.return_type(argument).width;
                if c < offset + width {
                    return Ok(ast.component(argument, c - offset));
                }
                offset += width;
            }
            let zero = Value::zero(data_type.register_type).ok_or_else(|| {
                CompileError::type_error(ast.describe(vector), "constructor has no known type")
            })?;
            ast.create_constant(zero)
        }
        NodeKind::Swizzle {
            operand, components, ..
        } => ast.component(operand, components[c as usize & 3]),
        NodeKind::Unary {
            op: UnaryOp::TypeConversion,
            operand,
        } => {
            let operand = ast.component(operand, c);
            ast.create_conversion(data_type.register_type, operand)
        }
        NodeKind::Unary { op, operand } if !op.is_vector_op() => {
            let operand = ast.component(operand, c);
            ast.create_unary(op, operand)
        }
        NodeKind::Binary { op, operands: [a, b] } if !op.is_vector_op() => {
            let a = ast.component(a, c);
            let b = ast.component(b, c);
            ast.create_binary(op, a, b)
        }
        NodeKind::Ternary {
            op,
            operands: [x, y, z],
        } => {
            let x = ast.component(x, c);
            let y = ast.component(y, c);
            let z = ast.component(z, c);
            ast.create_ternary(op, x, y, z)
        }
        NodeKind::FunctionCall { functions, arguments } => {
            let arguments = arguments.into_iter().map(|arg| ast.component(arg, c)).collect();
            ast.create_function_call(functions, arguments)
        }
        _ => selection,
    };
    Ok(scalar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{TraversalOrder, run_pass, vector};
    use crate::traversal::TraversalState;
    use exprc_core::{DataType, StreamDesc};

    fn scalarize(ast: &mut Ast) {
        vector::scalarize_inputs(ast).unwrap();
        vector::scalarize_outputs(ast).unwrap();
        let mut state = TraversalState::new();
        run_pass(ast, TraversalOrder::PreOrder, &mut state, scalarize_vector_instructions).unwrap();
    }

    fn input_name(ast: &Ast, id: NodeId) -> Option<String> {
        match &ast.node(id).kind {
            NodeKind::Input(desc) => Some(desc.name.clone()),
            _ => None,
        }
    }

    #[test]
    fn componentwise_add_is_split() {
        let mut ast = Ast::new();
        let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT2));
        let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT2));
        let add = ast.create_binary(BinaryOp::Add, a, b);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT2), add);

        scalarize(&mut ast);

        assert_eq!(ast.outputs().len(), 2);
        for (c, name) in ["x", "y"].iter().enumerate() {
            let out = ast.outputs()[c];
            let sum = ast.children(out)[0];
            assert_eq!(ast.return_type(sum), DataType::FLOAT);
            let [l, r] = ast.children(sum) else {
                panic!("expected binary node");
            };
            assert_eq!(input_name(&ast, *l), Some(format!("a.{name}")));
            assert_eq!(input_name(&ast, *r), Some(format!("b.{name}")));
        }
    }

    #[test]
    fn scalar_operand_is_broadcast() {
        let mut ast = Ast::new();
        let v = ast.add_input(StreamDesc::new("v", DataType::FLOAT3));
        let s = ast.add_input(StreamDesc::new("s", DataType::FLOAT));
        let mul = ast.create_binary(BinaryOp::Multiply, v, s);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT3), mul);

        scalarize(&mut ast);

        for &out in ast.outputs() {
            let product = ast.children(out)[0];
            assert_eq!(ast.children(product)[1], s);
        }
    }

    #[test]
    fn dot_expands_to_sum_of_products() {
        let mut ast = Ast::new();
        let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT3));
        let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT3));
        let dot = ast.create_binary(BinaryOp::Dot, a, b);
        let out = ast.add_output(StreamDesc::new("o", DataType::FLOAT), dot);

        scalarize(&mut ast);

        // ((a.x*b.x + a.y*b.y) + a.z*b.z)
        let outer = ast.children(out)[0];
        assert!(matches!(ast.node(outer).kind, NodeKind::Binary { op: BinaryOp::Add, .. }));
        let inner = ast.children(outer)[0];
        assert!(matches!(ast.node(inner).kind, NodeKind::Binary { op: BinaryOp::Add, .. }));
        let last = ast.children(outer)[1];
        assert!(matches!(ast.node(last).kind, NodeKind::Binary { op: BinaryOp::Multiply, .. }));
        assert_eq!(input_name(&ast, ast.children(last)[0]), Some("a.z".to_string()));
    }

    #[test]
    fn shared_vector_node_yields_shared_components() {
        let mut ast = Ast::new();
        let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT2));
        let sq = ast.create_binary(BinaryOp::Multiply, a, a);
        ast.add_output(StreamDesc::new("o1", DataType::FLOAT2), sq);
        ast.add_output(StreamDesc::new("o2", DataType::FLOAT2), sq);

        scalarize(&mut ast);

        let outputs = ast.outputs().to_vec();
        assert_eq!(outputs.len(), 4);
        assert_eq!(ast.children(outputs[0]), ast.children(outputs[2]));
        assert_eq!(ast.children(outputs[1]), ast.children(outputs[3]));
    }

    #[test]
    fn swizzle_and_constructor_resolve_to_scalars() {
        let mut ast = Ast::new();
        let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
        let y = ast.add_input(StreamDesc::new("y", DataType::FLOAT));
        let ctor = ast.create_constructor(DataType::FLOAT3, vec![x, y]);
        let swizzled = ast.create_swizzle(ctor, &[2, 1, 0]);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT3), swizzled);

        scalarize(&mut ast);

        let outputs = ast.outputs().to_vec();
        assert_eq!(ast.constant_value(ast.children(outputs[0])[0]), Some(Value::Float(0.0)));
        assert_eq!(ast.children(outputs[1]), &[y]);
        assert_eq!(ast.children(outputs[2]), &[x]);
    }

    #[test]
    fn all_expands_to_logical_and() {
        let mut ast = Ast::new();
        let b = ast.add_input(StreamDesc::new("b", DataType::BOOL2));
        let all = ast.create_unary(UnaryOp::All, b);
        let out = ast.add_output(StreamDesc::new("o", DataType::BOOL), all);

        scalarize(&mut ast);

        let and = ast.children(out)[0];
        assert!(matches!(ast.node(and).kind, NodeKind::Binary { op: BinaryOp::LogicalAnd, .. }));
        assert_eq!(input_name(&ast, ast.children(and)[0]), Some("b.x".to_string()));
        assert_eq!(input_name(&ast, ast.children(and)[1]), Some("b.y".to_string()));
    }
}
