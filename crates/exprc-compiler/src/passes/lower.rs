//! Replacement of instructions the VM can't execute.
//!
//! Runs pre-order after scalarization. Every rewrite produces operators that
//! have an opcode for the operand's register class:
//!
//! | Operator            | Replacement                         |
//! |---------------------|-------------------------------------|
//! | `-x`                | `0 - x`                             |
//! | `saturate(x)`       | `max(min(x, 1), 0)`                 |
//! | `clamp(x, lo, hi)`  | `max(min(x, hi), lo)`               |
//! | `lerp(a, b, t)`     | `a + (b - a) * t`                   |
//! | `degrees(x)`        | `x * (180 / pi)`                    |
//! | `radians(x)`        | `x * (pi / 180)`                    |
//! | `frac(x)`           | `x - trunc(x)`                      |
//! | `x % y` (float)     | `x - trunc(x / y) * y`              |
//! | `x % y` (int)       | `x - (x / y) * y`                   |
//! | `log(x, b)`         | `ln(x) / ln(b)`                     |
//! | `pow(x, y)` (float) | `pow2(y * log2(x))`                 |
//! | `pow(x, n)` (int)   | `x * x * ...` for small constant `n`|
//! | `pow2(n)` (int)     | `1 << n`                            |
//! | `bool(x)`           | `x != 0`                            |
//! | `int(b)`/`float(b)` | `b ? 1 : 0`                         |
//!
//! Conversions to the operand's own register class are removed.

use std::f32::consts::PI;

use exprc_core::{Ast, BinaryOp, CompileError, NodeId, NodeKind, RegisterType, TernaryOp, UnaryOp, Value};

use super::rewrite_until_stable;
use super::types::convert;

/// Largest constant exponent an integer `pow` is unrolled for.
const MAX_UNROLLED_EXPONENT: i32 = 16;

/// Pre-order transform lowering unsupported instructions.
///
/// Removing a conversion can expose another unsupported node, which is
/// lowered in the same call.
pub fn replace_unsupported_instructions(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    rewrite_until_stable(ast, id, replace_unsupported_instruction)
}

fn replace_unsupported_instruction(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    let register_type = ast.register_type(id);
    let int = register_type == RegisterType::Int;

    let replaced = match ast.node(id).kind {
        NodeKind::Unary {
            op: UnaryOp::TypeConversion,
            operand,
        } => lower_conversion(ast, operand, register_type).unwrap_or(id),
        NodeKind::Unary { op, operand } => match op {
            UnaryOp::Negate => {
                let zero = zero(ast, register_type)?;
                ast.create_binary(BinaryOp::Subtract, zero, operand)
            }
            UnaryOp::Saturate => {
                let zero = zero(ast, register_type)?;
                let one = one(ast, register_type)?;
                let min = ast.create_binary(BinaryOp::Min, operand, one);
                ast.create_binary(BinaryOp::Max, min, zero)
            }
            UnaryOp::RadToDeg => {
                let factor = ast.create_constant(180.0 / PI);
                ast.create_binary(BinaryOp::Multiply, operand, factor)
            }
            UnaryOp::DegToRad => {
                let factor = ast.create_constant(PI / 180.0);
                ast.create_binary(BinaryOp::Multiply, operand, factor)
            }
            UnaryOp::Frac => {
                let whole = ast.create_unary(UnaryOp::Trunc, operand);
                ast.create_binary(BinaryOp::Subtract, operand, whole)
            }
            UnaryOp::Pow2 if int => {
                let one = ast.create_constant(1i32);
                ast.create_binary(BinaryOp::BitshiftLeft, one, operand)
            }
            _ => id,
        },
        NodeKind::Binary { op, operands: [x, y] } => match op {
            BinaryOp::Modulo => {
                let quotient = ast.create_binary(BinaryOp::Divide, x, y);
                let whole = if int {
                    quotient
                } else {
                    ast.create_unary(UnaryOp::Trunc, quotient)
                };
                let product = ast.create_binary(BinaryOp::Multiply, whole, y);
                ast.create_binary(BinaryOp::Subtract, x, product)
            }
            BinaryOp::Log => {
                let numerator = ast.create_unary(UnaryOp::Ln, x);
                let denominator = ast.create_unary(UnaryOp::Ln, y);
                ast.create_binary(BinaryOp::Divide, numerator, denominator)
            }
            BinaryOp::Pow if int => lower_int_pow(ast, x, y),
            BinaryOp::Pow => float_pow(ast, x, y),
            _ => id,
        },
        NodeKind::Ternary { op, operands: [a, b, c] } => match op {
            TernaryOp::Clamp => {
                let min = ast.create_binary(BinaryOp::Min, a, c);
                ast.create_binary(BinaryOp::Max, min, b)
            }
            TernaryOp::Lerp => {
                let delta = ast.create_binary(BinaryOp::Subtract, b, a);
                let scaled = ast.create_binary(BinaryOp::Multiply, delta, c);
                ast.create_binary(BinaryOp::Add, a, scaled)
            }
            TernaryOp::Select => id,
        },
        _ => id,
    };
    Ok(replaced)
}

fn zero(ast: &mut Ast, register_type: RegisterType) -> Result<NodeId, CompileError> {
    let value = Value::zero(register_type)
        .ok_or_else(|| CompileError::malformed(format!("no zero constant for {}", register_type.name())))?;
    Ok(ast.create_constant(value))
}

fn one(ast: &mut Ast, register_type: RegisterType) -> Result<NodeId, CompileError> {
    let value = Value::one(register_type)
        .ok_or_else(|| CompileError::malformed(format!("no one constant for {}", register_type.name())))?;
    Ok(ast.create_constant(value))
}

/// Rewrite a conversion the VM has no instruction for.
///
/// Returns `None` for int/float conversions, which are executed directly.
fn lower_conversion(ast: &mut Ast, operand: NodeId, target: RegisterType) -> Option<NodeId> {
    let source = ast.register_type(operand);
    if source == target {
        return Some(operand);
    }
    match (source, target) {
        (RegisterType::Bool, RegisterType::Int | RegisterType::Float) => {
            let one = ast.create_constant(Value::one(target)?);
            let zero = ast.create_constant(Value::zero(target)?);
            Some(ast.create_ternary(TernaryOp::Select, operand, one, zero))
        }
        (RegisterType::Int | RegisterType::Float, RegisterType::Bool) => {
            let zero = ast.create_constant(Value::zero(source)?);
            Some(ast.create_binary(BinaryOp::NotEqual, operand, zero))
        }
        _ => None,
    }
}

/// `pow2(y * log2(x))`
fn float_pow(ast: &mut Ast, x: NodeId, y: NodeId) -> NodeId {
    let log = ast.create_unary(UnaryOp::Log2, x);
    let product = ast.create_binary(BinaryOp::Multiply, y, log);
    ast.create_unary(UnaryOp::Pow2, product)
}

fn lower_int_pow(ast: &mut Ast, x: NodeId, y: NodeId) -> NodeId {
    match ast.constant_value(y) {
        Some(Value::Int(0)) => ast.create_constant(1i32),
        Some(Value::Int(n)) if (1..=MAX_UNROLLED_EXPONENT).contains(&n) => {
            let mut product = x;
            for _ in 1..n {
                product = ast.create_binary(BinaryOp::Multiply, product, x);
            }
            product
        }
        _ => {
            let x = convert(ast, x, RegisterType::Float);
            let y = convert(ast, y, RegisterType::Float);
            let pow = ast.create_binary(BinaryOp::Pow, x, y);
            ast.create_conversion(RegisterType::Int, pow)
        }
    }
}
