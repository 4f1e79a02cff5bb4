//! Opcode selection.
//!
//! Maps a node kind and register class to a VM opcode. Combinations the VM
//! has no instruction for map to [`OpCode::Nop`], which the emitter reports
//! as an unsupported operation.

use exprc_core::{Ast, BinaryOp, NodeId, NodeKind, RegisterType, TernaryOp, UnaryOp};

use crate::bytecode::OpCode;

/// Opcode for a scheduled node.
///
/// Binary operators are selected by their left operand's register class,
/// so comparisons pick the operand encoding rather than the bool result.
/// A constant right operand selects the register-constant form.
pub fn select_opcode(ast: &Ast, id: NodeId) -> OpCode {
    let node = ast.node(id);
    let register_type = node.register_type();

    match &node.kind {
        NodeKind::Constant(_) => OpCode::MovXC,
        NodeKind::Input(_) => match register_type {
            RegisterType::Float => OpCode::LoadF,
            RegisterType::Int | RegisterType::Bool => OpCode::LoadI,
            RegisterType::Unknown => OpCode::Nop,
        },
        NodeKind::Output { .. } => match register_type {
            RegisterType::Float => OpCode::StoreF,
            RegisterType::Int | RegisterType::Bool => OpCode::StoreI,
            RegisterType::Unknown => OpCode::Nop,
        },
        NodeKind::Unary { op, .. } => unary_opcode(*op, register_type),
        NodeKind::Binary { op, operands: [left, right] } => {
            let opcode = binary_opcode(*op, ast.register_type(*left));
            if ast.is_constant(*right) {
                opcode.with_constant_right().unwrap_or(OpCode::Nop)
            } else {
                opcode
            }
        }
        NodeKind::Ternary { op, .. } => ternary_opcode(*op, register_type),
        NodeKind::FunctionCall { .. } => OpCode::Call,
        NodeKind::Constructor { .. } | NodeKind::Swizzle { .. } => OpCode::Nop,
    }
}

/// Opcode of a unary operator producing `register_type`.
pub fn unary_opcode(op: UnaryOp, register_type: RegisterType) -> OpCode {
    use RegisterType::{Bool, Float, Int};

    match (op, register_type) {
        (UnaryOp::Absolute, Float) => OpCode::AbsF,
        (UnaryOp::Absolute, Int) => OpCode::AbsI,
        (UnaryOp::Sqrt, Float) => OpCode::SqrtF,
        (UnaryOp::Exp, Float) => OpCode::ExpF,
        (UnaryOp::Ln, Float) => OpCode::LnF,
        (UnaryOp::Log2, Float) => OpCode::Log2F,
        (UnaryOp::Log2, Int) => OpCode::Log2I,
        (UnaryOp::Log10, Float) => OpCode::Log10F,
        (UnaryOp::Pow2, Float) => OpCode::Pow2F,
        (UnaryOp::Sin, Float) => OpCode::SinF,
        (UnaryOp::Cos, Float) => OpCode::CosF,
        (UnaryOp::Tan, Float) => OpCode::TanF,
        (UnaryOp::ASin, Float) => OpCode::ASinF,
        (UnaryOp::ACos, Float) => OpCode::ACosF,
        (UnaryOp::ATan, Float) => OpCode::ATanF,
        (UnaryOp::Round, Float) => OpCode::RoundF,
        (UnaryOp::Floor, Float) => OpCode::FloorF,
        (UnaryOp::Ceil, Float) => OpCode::CeilF,
        (UnaryOp::Trunc, Float) => OpCode::TruncF,
        (UnaryOp::BitwiseNot, Int) => OpCode::NotI,
        (UnaryOp::LogicalNot, Bool) => OpCode::NotB,
        (UnaryOp::TypeConversion, Float) => OpCode::IToF,
        (UnaryOp::TypeConversion, Int) => OpCode::FToI,
        _ => OpCode::Nop,
    }
}

/// Register-register opcode of a binary operator over `register_type`
/// operands.
pub fn binary_opcode(op: BinaryOp, register_type: RegisterType) -> OpCode {
    use RegisterType::{Bool, Float, Int};

    match (op, register_type) {
        (BinaryOp::Add, Float) => OpCode::AddF,
        (BinaryOp::Add, Int) => OpCode::AddI,
        (BinaryOp::Subtract, Float) => OpCode::SubF,
        (BinaryOp::Subtract, Int) => OpCode::SubI,
        (BinaryOp::Multiply, Float) => OpCode::MulF,
        (BinaryOp::Multiply, Int) => OpCode::MulI,
        (BinaryOp::Divide, Float) => OpCode::DivF,
        (BinaryOp::Divide, Int) => OpCode::DivI,
        (BinaryOp::Min, Float) => OpCode::MinF,
        (BinaryOp::Min, Int) => OpCode::MinI,
        (BinaryOp::Max, Float) => OpCode::MaxF,
        (BinaryOp::Max, Int) => OpCode::MaxI,
        (BinaryOp::BitshiftLeft, Int) => OpCode::ShlI,
        (BinaryOp::BitshiftRight, Int) => OpCode::ShrI,
        (BinaryOp::BitwiseAnd, Int) => OpCode::AndI,
        (BinaryOp::BitwiseXor, Int) => OpCode::XorI,
        (BinaryOp::BitwiseOr, Int) => OpCode::OrI,
        (BinaryOp::Equal, Float) => OpCode::EqF,
        (BinaryOp::Equal, Int) => OpCode::EqI,
        (BinaryOp::Equal, Bool) => OpCode::EqB,
        (BinaryOp::NotEqual, Float) => OpCode::NEqF,
        (BinaryOp::NotEqual, Int) => OpCode::NEqI,
        (BinaryOp::NotEqual, Bool) => OpCode::NEqB,
        (BinaryOp::Less, Float) => OpCode::LtF,
        (BinaryOp::Less, Int) => OpCode::LtI,
        (BinaryOp::LessEqual, Float) => OpCode::LEqF,
        (BinaryOp::LessEqual, Int) => OpCode::LEqI,
        (BinaryOp::Greater, Float) => OpCode::GtF,
        (BinaryOp::Greater, Int) => OpCode::GtI,
        (BinaryOp::GreaterEqual, Float) => OpCode::GEqF,
        (BinaryOp::GreaterEqual, Int) => OpCode::GEqI,
        (BinaryOp::LogicalAnd, Bool) => OpCode::AndB,
        (BinaryOp::LogicalOr, Bool) => OpCode::OrB,
        _ => OpCode::Nop,
    }
}

/// Opcode of a ternary operator producing `register_type`.
pub fn ternary_opcode(op: TernaryOp, register_type: RegisterType) -> OpCode {
    match (op, register_type) {
        (TernaryOp::Select, RegisterType::Float) => OpCode::SelF,
        (TernaryOp::Select, RegisterType::Int) => OpCode::SelI,
        (TernaryOp::Select, RegisterType::Bool) => OpCode::SelB,
        _ => OpCode::Nop,
    }
}
