//! Type deduction and conversion insertion.
//!
//! Runs post-order, so every node sees fully typed children.
//!
//! ## Algorithm
//!
//! 1. Resolve the node's overload from its children's register types and
//!    compute its width (scalars broadcast, vectors must agree).
//! 2. Fail with a type error if no overload matches.
//! 3. Convert each child whose register type differs from the selected
//!    signature. Constants are re-typed directly; anything else gets a
//!    `TypeConversion` node.
//! 4. For output nodes, adapt the expression width to the declared output
//!    width: scalars are broadcast, wider vectors truncated, narrower
//!    vectors padded with zero.

use exprc_core::ast::broadcast_width;
use exprc_core::{Ast, CompileError, DataType, NodeId, NodeKind, RegisterType};

/// Post-order transform deducing types and inserting conversions.
pub fn deduce_types(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    ast.deduce_type(id);
    if !ast.return_type(id).is_known() {
        return Err(type_error(ast, id));
    }

    for slot in 0..ast.children(id).len() {
        let child = ast.children(id)[slot];
        let Some(expected) = ast.expected_child_type(id, slot) else {
            continue;
        };
        if expected.is_known() && ast.register_type(child) != expected {
            let converted = convert(ast, child, expected);
            ast.set_child(id, slot, converted);
        }
    }

    if let NodeKind::Output { expression, .. } = ast.node(id).kind {
        let target = ast.return_type(id);
        let adapted = adapt_width(ast, expression, target);
        if adapted != expression {
            ast.set_child(id, 0, adapted);
        }
    }

    Ok(id)
}

/// Convert `id` to another register class, keeping its width.
pub fn convert(ast: &mut Ast, id: NodeId, target: RegisterType) -> NodeId {
    if let Some(converted) = ast.constant_value(id).and_then(|value| value.convert(target)) {
        return ast.create_constant(converted);
    }
    ast.create_conversion(target, id)
}

fn adapt_width(ast: &mut Ast, expression: NodeId, target: DataType) -> NodeId {
    let width = ast.return_type(expression).width;
    if width == target.width {
        expression
    } else if width > target.width {
        let selection: Vec<u8> = (0..target.width).collect();
        ast.create_swizzle(expression, &selection)
    } else {
        ast.create_constructor(target, vec![expression])
    }
}

fn type_error(ast: &Ast, id: NodeId) -> CompileError {
    let node = ast.node(id);
    let types: Vec<DataType> = node.children().iter().map(|&child| ast.return_type(child)).collect();
    let operands: Vec<String> = types.iter().map(ToString::to_string).collect();
    let widths_agree = broadcast_width(&types).is_some();

    let message = match &node.kind {
        NodeKind::Constructor { .. } => "constructor has no known type".to_string(),
        NodeKind::Input(_) | NodeKind::Output { .. } => "stream has no known type".to_string(),
        _ if !widths_agree => format!("incompatible operand widths ({})", operands.join(", ")),
        NodeKind::FunctionCall { functions, .. } => format!(
            "no overload of '{}' accepts ({})",
            functions.first().map(|f| f.name.as_str()).unwrap_or("?"),
            operands.join(", ")
        ),
        kind => format!("no overload of {} accepts ({})", kind.name(), operands.join(", ")),
    };
    CompileError::type_error(ast.describe(id), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{TraversalOrder, run_pass};
    use crate::traversal::TraversalState;
    use exprc_core::{BinaryOp, ErrorKind, FunctionDesc, StreamDesc, UnaryOp, Value};

    fn run(ast: &mut Ast) -> Result<(), CompileError> {
        let mut state = TraversalState::new();
        run_pass(ast, TraversalOrder::PostOrder, &mut state, deduce_types)
    }

    #[test]
    fn int_operand_is_converted_to_float() {
        let mut ast = Ast::new();
        let i = ast.add_input(StreamDesc::new("i", DataType::INT));
        let f = ast.add_input(StreamDesc::new("f", DataType::FLOAT));
        let add = ast.create_binary(BinaryOp::Add, i, f);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT), add);

        run(&mut ast).unwrap();

        let left = ast.children(add)[0];
        assert_ne!(left, i);
        assert!(matches!(
            ast.node(left).kind,
            NodeKind::Unary {
                op: UnaryOp::TypeConversion,
                operand
            } if operand == i
        ));
        assert_eq!(ast.return_type(left), DataType::FLOAT);
    }

    #[test]
    fn constants_are_retyped_in_place() {
        let mut ast = Ast::new();
        let f = ast.add_input(StreamDesc::new("f", DataType::FLOAT));
        let two = ast.create_constant(2i32);
        let mul = ast.create_binary(BinaryOp::Multiply, f, two);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT), mul);

        run(&mut ast).unwrap();

        let right = ast.children(mul)[1];
        assert_eq!(ast.constant_value(right), Some(Value::Float(2.0)));
    }

    #[test]
    fn output_converts_to_declared_type() {
        let mut ast = Ast::new();
        let f = ast.add_input(StreamDesc::new("f", DataType::FLOAT));
        let out = ast.add_output(StreamDesc::new("o", DataType::INT), f);

        run(&mut ast).unwrap();

        let expression = ast.children(out)[0];
        assert_eq!(ast.return_type(expression), DataType::INT);
    }

    #[test]
    fn scalar_output_expression_is_broadcast() {
        let mut ast = Ast::new();
        let f = ast.add_input(StreamDesc::new("f", DataType::FLOAT));
        let out = ast.add_output(StreamDesc::new("o", DataType::FLOAT3), f);

        run(&mut ast).unwrap();

        let expression = ast.children(out)[0];
        assert!(matches!(ast.node(expression).kind, NodeKind::Constructor { .. }));
        assert_eq!(ast.return_type(expression), DataType::FLOAT3);
    }

    #[test]
    fn wide_output_expression_is_truncated() {
        let mut ast = Ast::new();
        let v = ast.add_input(StreamDesc::new("v", DataType::FLOAT4));
        let out = ast.add_output(StreamDesc::new("o", DataType::FLOAT2), v);

        run(&mut ast).unwrap();

        let expression = ast.children(out)[0];
        assert!(matches!(ast.node(expression).kind, NodeKind::Swizzle { count: 2, .. }));
        assert_eq!(ast.return_type(expression), DataType::FLOAT2);
    }

    #[test]
    fn mismatched_vector_widths_are_type_error() {
        let mut ast = Ast::new();
        let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT2));
        let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT3));
        let add = ast.create_binary(BinaryOp::Add, a, b);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT), add);

        let err = run(&mut ast).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeError);
        assert!(err.to_string().contains("Float2, Float3"), "{err}");
    }

    #[test]
    fn unknown_input_is_type_error() {
        let mut ast = Ast::new();
        let x = ast.add_input(StreamDesc::new("x", DataType::UNKNOWN));
        let neg = ast.create_unary(UnaryOp::Sqrt, x);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT), neg);

        let err = run(&mut ast).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeError);
    }

    #[test]
    fn function_arguments_are_converted() {
        let mut ast = Ast::new();
        let i = ast.add_input(StreamDesc::new("i", DataType::INT));
        let desc = FunctionDesc::new("f", vec![RegisterType::Float], RegisterType::Float);
        let call = ast.create_function_call(vec![desc], vec![i]);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT), call);

        run(&mut ast).unwrap();

        let arg = ast.children(call)[0];
        assert_eq!(ast.return_type(arg), DataType::FLOAT);
    }
}
