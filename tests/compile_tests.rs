//! Integration tests for the full compile pipeline.
//!
//! Each test builds an expression DAG, compiles it with a fresh
//! [`Compiler`] and checks the resulting program.

use exprc::prelude::*;

fn compile(ast: &mut Ast) -> Result<Program, CompileError> {
    Compiler::new().compile(ast)
}

fn names(descs: &[StreamDesc]) -> Vec<&str> {
    descs.iter().map(|desc| desc.name.as_str()).collect()
}

// =============================================================================
// Basic Programs
// =============================================================================

#[test]
fn test_add_constant() {
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    let two = ast.create_constant(2.0f32);
    let sum = ast.create_binary(BinaryOp::Add, x, two);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), sum);

    let program = compile(&mut ast).unwrap();

    assert_eq!(names(program.inputs()), vec!["x"]);
    assert_eq!(names(program.outputs()), vec!["o"]);
    program.assert_opcodes(&[OpCode::LoadF, OpCode::AddFC, OpCode::StoreF]);
    assert_eq!(
        program.byte_code(),
        &[
            OpCode::LoadF.into(),
            0,
            0,
            OpCode::AddFC.into(),
            0,
            0,
            2.0f32.to_bits(),
            OpCode::StoreF.into(),
            0,
            0,
        ]
    );
    assert_eq!(program.num_temp_registers(), 1);
    assert_eq!(program.num_instructions(), 3);
}

#[test]
fn test_constant_on_left_is_swapped() {
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    let two = ast.create_constant(2.0f32);
    let product = ast.create_binary(BinaryOp::Multiply, two, x);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), product);

    let program = compile(&mut ast).unwrap();

    program.assert_opcodes(&[OpCode::LoadF, OpCode::MulFC, OpCode::StoreF]);
}

#[test]
fn test_constant_output() {
    let mut ast = Ast::new();
    let two = ast.create_constant(2.0f32);
    let three = ast.create_constant(3.0f32);
    let sum = ast.create_binary(BinaryOp::Add, two, three);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), sum);

    let program = compile(&mut ast).unwrap();

    assert!(program.inputs().is_empty());
    assert_eq!(
        program.byte_code(),
        &[OpCode::MovXC.into(), 0, 5.0f32.to_bits(), OpCode::StoreF.into(), 0, 0]
    );
    assert_eq!(program.num_temp_registers(), 1);
}

#[test]
fn test_shared_subexpression_is_computed_once() {
    let mut ast = Ast::new();
    let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT));
    let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT));
    let left = ast.create_binary(BinaryOp::Multiply, a, b);
    let right = ast.create_binary(BinaryOp::Multiply, a, b);
    let sum = ast.create_binary(BinaryOp::Add, left, right);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), sum);

    let program = compile(&mut ast).unwrap();

    program.assert_opcodes(&[
        OpCode::LoadF,
        OpCode::LoadF,
        OpCode::MulF,
        OpCode::AddF,
        OpCode::StoreF,
    ]);
    assert_eq!(program.num_temp_registers(), 2);

    // both operands of the sum read the single product register
    let code = program.byte_code();
    let offset_of = |op: OpCode| {
        program
            .instructions()
            .into_iter()
            .find(|&(_, found)| found == op)
            .map(|(offset, _)| offset)
            .unwrap()
    };
    let mul = offset_of(OpCode::MulF);
    let add = offset_of(OpCode::AddF);
    assert_eq!(code[add + 2], code[mul + 1]);
    assert_eq!(code[add + 3], code[mul + 1]);
}

#[test]
fn test_multiple_outputs_share_nodes() {
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    let y = ast.add_input(StreamDesc::new("y", DataType::FLOAT));
    let product = ast.create_binary(BinaryOp::Multiply, x, y);
    let root = ast.create_unary(UnaryOp::Sqrt, product);
    ast.add_output(StreamDesc::new("product", DataType::FLOAT), product);
    ast.add_output(StreamDesc::new("root", DataType::FLOAT), root);

    let program = compile(&mut ast).unwrap();

    // the last output is scheduled first
    program.assert_opcodes(&[
        OpCode::LoadF,
        OpCode::LoadF,
        OpCode::MulF,
        OpCode::SqrtF,
        OpCode::StoreF,
        OpCode::StoreF,
    ]);
    assert_eq!(names(program.outputs()), vec!["product", "root"]);
}

// =============================================================================
// Types and Lowering
// =============================================================================

#[test]
fn test_output_conversion() {
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    ast.add_output(StreamDesc::new("o", DataType::INT), x);

    let program = compile(&mut ast).unwrap();

    program.assert_opcodes(&[OpCode::LoadF, OpCode::FToI, OpCode::StoreI]);
}

#[test]
fn test_negate_is_lowered() {
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    let negated = ast.create_unary(UnaryOp::Negate, x);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), negated);

    let program = compile(&mut ast).unwrap();

    program.assert_opcodes(&[OpCode::MovXC, OpCode::LoadF, OpCode::SubF, OpCode::StoreF]);
}

#[test]
fn test_int_pow_unrolls() {
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::INT));
    let three = ast.create_constant(3i32);
    let cube = ast.create_binary(BinaryOp::Pow, x, three);
    ast.add_output(StreamDesc::new("o", DataType::INT), cube);

    let program = compile(&mut ast).unwrap();

    program.assert_opcodes(&[OpCode::LoadI, OpCode::MulI, OpCode::MulI, OpCode::StoreI]);
}

#[test]
fn test_select_with_comparison() {
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT));
    let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT));
    let one = ast.create_constant(1.0f32);
    let less = ast.create_binary(BinaryOp::Less, x, one);
    let select = ast.create_ternary(TernaryOp::Select, less, a, b);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), select);

    let program = compile(&mut ast).unwrap();

    program.assert_opcodes(&[
        OpCode::LoadF,
        OpCode::LtFC,
        OpCode::LoadF,
        OpCode::LoadF,
        OpCode::SelF,
        OpCode::StoreF,
    ]);
}

// =============================================================================
// Vectors
// =============================================================================

#[test]
fn test_vector_add_is_scalarized() {
    let mut ast = Ast::new();
    let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT3));
    let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT3));
    let sum = ast.create_binary(BinaryOp::Add, a, b);
    ast.add_output(StreamDesc::new("c", DataType::FLOAT3), sum);

    let program = compile(&mut ast).unwrap();

    assert_eq!(names(program.inputs()), vec!["a.x", "a.y", "a.z", "b.x", "b.y", "b.z"]);
    assert_eq!(names(program.outputs()), vec!["c.x", "c.y", "c.z"]);
    program.assert_opcodes(&[
        OpCode::LoadF,
        OpCode::LoadF,
        OpCode::AddF,
        OpCode::StoreF,
        OpCode::LoadF,
        OpCode::LoadF,
        OpCode::AddF,
        OpCode::StoreF,
        OpCode::LoadF,
        OpCode::LoadF,
        OpCode::AddF,
        OpCode::StoreF,
    ]);
}

#[test]
fn test_vector_length() {
    let mut ast = Ast::new();
    let v = ast.add_input(StreamDesc::new("v", DataType::FLOAT2));
    let length = ast.create_unary(UnaryOp::Length, v);
    ast.add_output(StreamDesc::new("len", DataType::FLOAT), length);

    let program = compile(&mut ast).unwrap();

    assert_eq!(names(program.inputs()), vec!["v.x", "v.y"]);
    program.assert_opcodes(&[
        OpCode::LoadF,
        OpCode::MulF,
        OpCode::LoadF,
        OpCode::MulF,
        OpCode::AddF,
        OpCode::SqrtF,
        OpCode::StoreF,
    ]);
}

// =============================================================================
// Function Calls
// =============================================================================

#[test]
fn test_function_table_is_deduplicated() {
    let noise = FunctionDesc::new("noise", vec![RegisterType::Float], RegisterType::Float);
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    let y = ast.add_input(StreamDesc::new("y", DataType::FLOAT));
    let nx = ast.create_function_call(vec![noise.clone()], vec![x]);
    let ny = ast.create_function_call(vec![noise], vec![y]);
    let sum = ast.create_binary(BinaryOp::Add, nx, ny);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), sum);

    let program = compile(&mut ast).unwrap();

    assert_eq!(program.functions().len(), 1);
    assert_eq!(program.functions()[0].name, "noise(Float)");
    program.assert_opcodes(&[
        OpCode::LoadF,
        OpCode::Call,
        OpCode::LoadF,
        OpCode::Call,
        OpCode::AddF,
        OpCode::StoreF,
    ]);
}

#[test]
fn test_function_overload_by_argument_type() {
    let float_noise = FunctionDesc::new("noise", vec![RegisterType::Float], RegisterType::Float);
    let int_noise = FunctionDesc::new("noise", vec![RegisterType::Int], RegisterType::Float);
    let mut ast = Ast::new();
    let i = ast.add_input(StreamDesc::new("i", DataType::INT));
    let call = ast.create_function_call(vec![float_noise, int_noise], vec![i]);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), call);

    let program = compile(&mut ast).unwrap();

    assert_eq!(program.functions()[0].name, "noise(Int)");
    program.assert_opcodes(&[OpCode::LoadI, OpCode::Call, OpCode::StoreF]);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_no_outputs_is_malformed() {
    let mut ast = Ast::new();
    ast.add_input(StreamDesc::new("x", DataType::FLOAT));

    let err = compile(&mut ast).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_unknown_input_type_fails() {
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::UNKNOWN));
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), x);

    let err = compile(&mut ast).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TypeError);
}

#[test]
fn test_renamed_output_is_undeclared() {
    let rename = Pass::new("rename", TraversalOrder::PreOrder, |ast, id| {
        if let NodeKind::Output { desc, expression } = &ast.node(id).kind
            && desc.name == "o"
        {
            let desc = StreamDesc::new("renamed", desc.data_type);
            let expression = *expression;
            return Ok(ast.create_output(desc, expression));
        }
        Ok(id)
    });
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), x);

    let err = CompilerConfig::new().with_pass(rename).build().compile(&mut ast).unwrap_err();

    assert_eq!(err, CompileError::UndeclaredOutput { name: "renamed".into() });
}

#[test]
fn test_output_replaced_by_non_output_is_malformed() {
    let unwrap_output = Pass::new("unwrap", TraversalOrder::PostOrder, |ast, id| match ast.node(id).kind {
        NodeKind::Output { expression, .. } => Ok(expression),
        _ => Ok(id),
    });
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), x);

    let err = CompilerConfig::new()
        .with_pass(unwrap_output)
        .build()
        .compile(&mut ast)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_leftover_vector_fails_validation() {
    let widen = Pass::new("widen", TraversalOrder::PostOrder, |ast, id| match ast.node(id).kind {
        NodeKind::Input(_) => Ok(ast.create_constructor(DataType::FLOAT2, vec![id, id])),
        _ => Ok(id),
    });
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    let root = ast.create_unary(UnaryOp::Sqrt, x);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), root);

    let err = CompilerConfig::new().with_pass(widen).build().compile(&mut ast).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[test]
fn test_operation_without_instruction_fails_validation() {
    let sqrt_to_negate = Pass::new("negate", TraversalOrder::PostOrder, |ast, id| match ast.node(id).kind {
        NodeKind::Unary {
            op: UnaryOp::Sqrt,
            operand,
        } => Ok(ast.create_unary(UnaryOp::Negate, operand)),
        _ => Ok(id),
    });
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    let root = ast.create_unary(UnaryOp::Sqrt, x);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), root);

    let err = CompilerConfig::new()
        .with_pass(sqrt_to_negate)
        .build()
        .compile(&mut ast)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[test]
fn test_commuting_pass_runs_once_per_node() {
    let commute = Pass::new("commute", TraversalOrder::PreOrder, |ast, id| match ast.node(id).kind {
        NodeKind::Binary {
            op: BinaryOp::Multiply,
            operands: [l, r],
        } if !ast.is_constant(l) && !ast.is_constant(r) => Ok(ast.create_binary(BinaryOp::Multiply, r, l)),
        _ => Ok(id),
    });
    let mut ast = Ast::new();
    let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT));
    let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT));
    let product = ast.create_binary(BinaryOp::Multiply, a, b);
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), product);

    let program = CompilerConfig::new().with_pass(commute).build().compile(&mut ast).unwrap();

    program.assert_opcodes(&[OpCode::LoadF, OpCode::LoadF, OpCode::MulF, OpCode::StoreF]);
}

// =============================================================================
// Determinism and Debug Output
// =============================================================================

#[test]
fn test_recompiling_compiled_ast_is_stable() {
    let mut ast = Ast::new();
    let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT));
    let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT));
    let t = ast.add_input(StreamDesc::new("t", DataType::FLOAT));
    let p = ast.add_input(StreamDesc::new("p", DataType::FLOAT3));
    let i = ast.add_input(StreamDesc::new("i", DataType::INT));

    let blend = ast.create_ternary(TernaryOp::Lerp, a, b, t);
    let negated = ast.create_unary(UnaryOp::Negate, a);
    let scaled = ast.create_binary(BinaryOp::Multiply, p, t);
    let three = ast.create_constant(3i32);
    let cube = ast.create_binary(BinaryOp::Pow, i, three);
    let less = ast.create_binary(BinaryOp::Less, a, b);
    let smaller = ast.create_ternary(TernaryOp::Select, less, a, b);
    ast.add_output(StreamDesc::new("blend", DataType::FLOAT), blend);
    ast.add_output(StreamDesc::new("negated", DataType::FLOAT), negated);
    ast.add_output(StreamDesc::new("scaled", DataType::FLOAT3), scaled);
    ast.add_output(StreamDesc::new("cube", DataType::INT), cube);
    ast.add_output(StreamDesc::new("smaller", DataType::FLOAT), smaller);

    let mut compiler = Compiler::new();
    let first = compiler.compile(&mut ast).unwrap();
    let nodes = ast.len();
    let second = compiler.compile(&mut ast).unwrap();

    assert_eq!(ast.len(), nodes);
    assert_eq!(first, second);
}



#[test]
fn test_compile_is_deterministic() {
    let mut ast = Ast::new();
    let p = ast.add_input(StreamDesc::new("p", DataType::FLOAT3));
    let s = ast.add_input(StreamDesc::new("s", DataType::FLOAT));
    let scaled = ast.create_binary(BinaryOp::Multiply, p, s);
    let normalized = ast.create_unary(UnaryOp::Normalize, scaled);
    ast.add_output(StreamDesc::new("n", DataType::FLOAT3), normalized);

    let first = compile(&mut ast.clone()).unwrap();
    let second = compile(&mut ast.clone()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.disassemble(), second.disassemble());
}

#[test]
fn test_debug_output_writes_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut ast = Ast::new();
    let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
    ast.add_output(StreamDesc::new("o", DataType::FLOAT), x);

    CompilerConfig::new()
        .with_debug_output(dir.path().join("expr.dot"))
        .build()
        .compile(&mut ast)
        .unwrap();

    for stage in [
        "_00",
        "_01_TypeConv",
        "_02_ReplacedVectorInst",
        "_03_Scalarized",
        "_04_ConstantFolded1",
        "_05_ReplacedUnsupportedInst",
        "_06_ConstantFolded2",
        "_07_Optimized",
    ] {
        let path = dir.path().join(format!("expr{stage}.dot"));
        assert!(path.exists(), "missing {}", path.display());
    }
}
