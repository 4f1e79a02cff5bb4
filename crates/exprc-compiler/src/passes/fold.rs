//! Constant folding and algebraic simplification.
//!
//! Runs post-order over scalarized trees, so a parent always sees folded
//! children. Evaluation follows VM semantics: integer arithmetic wraps,
//! float to int truncates, and operations the VM would trap on (integer
//! division by zero, negative integer powers) are left in place.
//!
//! Besides evaluating all-constant nodes the pass
//!
//! - moves a constant left operand to the right of a mirrorable operator,
//!   so the emitter can use the register-constant instruction form
//! - removes identities like `x - 0`, `x * 1` and `x && true`; a float
//!   `x + 0.0` is kept since it turns `-0.0` into `+0.0`
//! - resolves `Select` with a constant condition

use exprc_core::{Ast, BinaryOp, CompileError, NodeId, NodeKind, RegisterType, TernaryOp, UnaryOp, Value};

/// Post-order transform folding constant subexpressions.
pub fn fold_constants(ast: &mut Ast, id: NodeId) -> Result<NodeId, CompileError> {
    let node = ast.node(id);
    if node.return_type.is_vector() || !node.return_type.is_known() {
        return Ok(id);
    }
    let target = node.register_type();

    let folded = match node.kind {
        NodeKind::Unary { op, operand } => ast
            .constant_value(operand)
            .and_then(|value| eval_unary(op, value, target)),
        NodeKind::Binary { op, operands: [a, b] } => match (ast.constant_value(a), ast.constant_value(b)) {
            (Some(a), Some(b)) => eval_binary(op, a, b),
            (Some(_), None) => return Ok(swap_constant_operand(ast, id, op, a, b)),
            (None, Some(c)) => return Ok(simplify_binary(ast, id, op, a, c)),
            (None, None) => None,
        },
        NodeKind::Ternary {
            op: TernaryOp::Select,
            operands: [condition, on_true, on_false],
        } => match ast.constant_value(condition) {
            Some(condition) if condition.as_bool() => return Ok(on_true),
            Some(_) => return Ok(on_false),
            None => None,
        },
        NodeKind::Ternary { op, operands } => match operands.map(|operand| ast.constant_value(operand)) {
            [Some(x), Some(y), Some(z)] => eval_ternary(op, x, y, z),
            _ => None,
        },
        _ => None,
    };

    match folded {
        Some(value) if value.register_type() == target => Ok(ast.create_constant(value)),
        _ => Ok(id),
    }
}

fn swap_constant_operand(ast: &mut Ast, id: NodeId, op: BinaryOp, constant: NodeId, other: NodeId) -> NodeId {
    let Some(mirrored) = op.mirrored() else {
        return id;
    };
    let swapped = ast.create_binary(mirrored, other, constant);
    match ast.constant_value(constant) {
        Some(c) => simplify_binary(ast, swapped, mirrored, other, c),
        None => swapped,
    }
}

/// Remove identities of `left op constant`.
fn simplify_binary(ast: &mut Ast, id: NodeId, op: BinaryOp, left: NodeId, constant: Value) -> NodeId {
    let int = constant.register_type() == RegisterType::Int;
    let bits = constant.to_bits();
    match op {
        // -0.0 + 0.0 is +0.0, so a float sum only drops a -0.0 operand
        BinaryOp::Add if constant.is_zero() && (int || bits == (-0.0f32).to_bits()) => left,
        BinaryOp::Subtract if constant.is_zero() && (int || bits == 0) => left,
        BinaryOp::BitwiseOr
        | BinaryOp::BitwiseXor
        | BinaryOp::BitshiftLeft
        | BinaryOp::BitshiftRight
            if constant.is_zero() =>
        {
            left
        }
        BinaryOp::Multiply | BinaryOp::Divide if constant.is_one() => left,
        // 0 * NaN is NaN, so only integers fold to zero
        BinaryOp::Multiply | BinaryOp::BitwiseAnd if int && constant.is_zero() => ast.create_constant(0i32),
        BinaryOp::LogicalAnd if constant.as_bool() => left,
        BinaryOp::LogicalAnd => ast.create_constant(false),
        BinaryOp::LogicalOr if constant.as_bool() => ast.create_constant(true),
        BinaryOp::LogicalOr => left,
        _ => id,
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate a unary operator. `target` is the node's register type, which
/// only matters for conversions.
pub fn eval_unary(op: UnaryOp, value: Value, target: RegisterType) -> Option<Value> {
    if op == UnaryOp::TypeConversion {
        return value.convert(target);
    }

    let result = match value {
        Value::Float(x) => Value::Float(match op {
            UnaryOp::Negate => -x,
            UnaryOp::Absolute => x.abs(),
            UnaryOp::Saturate => x.clamp(0.0, 1.0),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Ln => x.ln(),
            UnaryOp::Log2 => x.log2(),
            UnaryOp::Log10 => x.log10(),
            UnaryOp::Pow2 => x.exp2(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Tan => x.tan(),
            UnaryOp::ASin => x.asin(),
            UnaryOp::ACos => x.acos(),
            UnaryOp::ATan => x.atan(),
            UnaryOp::RadToDeg => x.to_degrees(),
            UnaryOp::DegToRad => x.to_radians(),
            UnaryOp::Round => x.round_ties_even(),
            UnaryOp::Floor => x.floor(),
            UnaryOp::Ceil => x.ceil(),
            UnaryOp::Trunc => x.trunc(),
            UnaryOp::Frac => x - x.trunc(),
            UnaryOp::Length => x.abs(),
            _ => return None,
        }),
        Value::Int(x) => Value::Int(match op {
            UnaryOp::Negate => x.wrapping_neg(),
            UnaryOp::Absolute => x.wrapping_abs(),
            UnaryOp::Saturate => x.clamp(0, 1),
            UnaryOp::Log2 if x > 0 => x.ilog2() as i32,
            UnaryOp::Pow2 if (0..31).contains(&x) => 1 << x,
            UnaryOp::BitwiseNot => !x,
            _ => return None,
        }),
        Value::Bool(x) => Value::Bool(match op {
            UnaryOp::LogicalNot => !x,
            UnaryOp::All | UnaryOp::Any => x,
            _ => return None,
        }),
    };
    Some(result)
}

/// Evaluate a binary operator over operands of the same register type.
pub fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Option<Value> {
    let result = match (left, right) {
        (Value::Float(a), Value::Float(b)) => match op {
            BinaryOp::Add => Value::Float(a + b),
            BinaryOp::Subtract => Value::Float(a - b),
            BinaryOp::Multiply | BinaryOp::Dot => Value::Float(a * b),
            BinaryOp::Divide => Value::Float(a / b),
            BinaryOp::Modulo => Value::Float(a % b),
            BinaryOp::Log => Value::Float(a.ln() / b.ln()),
            BinaryOp::Pow => Value::Float(a.powf(b)),
            BinaryOp::Min => Value::Float(a.min(b)),
            BinaryOp::Max => Value::Float(a.max(b)),
            BinaryOp::Equal => Value::Bool(a == b),
            BinaryOp::NotEqual => Value::Bool(a != b),
            BinaryOp::Less => Value::Bool(a < b),
            BinaryOp::LessEqual => Value::Bool(a <= b),
            BinaryOp::Greater => Value::Bool(a > b),
            BinaryOp::GreaterEqual => Value::Bool(a >= b),
            _ => return None,
        },
        (Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::Add => Value::Int(a.wrapping_add(b)),
            BinaryOp::Subtract => Value::Int(a.wrapping_sub(b)),
            BinaryOp::Multiply | BinaryOp::Dot => Value::Int(a.wrapping_mul(b)),
            BinaryOp::Divide if b != 0 => Value::Int(a.wrapping_div(b)),
            BinaryOp::Modulo if b != 0 => Value::Int(a.wrapping_rem(b)),
            BinaryOp::Pow if b >= 0 => Value::Int(a.wrapping_pow(b as u32)),
            BinaryOp::Min => Value::Int(a.min(b)),
            BinaryOp::Max => Value::Int(a.max(b)),
            BinaryOp::BitshiftLeft => Value::Int(a.wrapping_shl(b as u32)),
            BinaryOp::BitshiftRight => Value::Int(a.wrapping_shr(b as u32)),
            BinaryOp::BitwiseAnd => Value::Int(a & b),
            BinaryOp::BitwiseXor => Value::Int(a ^ b),
            BinaryOp::BitwiseOr => Value::Int(a | b),
            BinaryOp::Equal => Value::Bool(a == b),
            BinaryOp::NotEqual => Value::Bool(a != b),
            BinaryOp::Less => Value::Bool(a < b),
            BinaryOp::LessEqual => Value::Bool(a <= b),
            BinaryOp::Greater => Value::Bool(a > b),
            BinaryOp::GreaterEqual => Value::Bool(a >= b),
            _ => return None,
        },
        (Value::Bool(a), Value::Bool(b)) => Value::Bool(match op {
            BinaryOp::Equal => a == b,
            BinaryOp::NotEqual => a != b,
            BinaryOp::LogicalAnd => a && b,
            BinaryOp::LogicalOr => a || b,
            _ => return None,
        }),
        _ => return None,
    };
    Some(result)
}

/// Evaluate a ternary operator.
pub fn eval_ternary(op: TernaryOp, x: Value, y: Value, z: Value) -> Option<Value> {
    match (op, x, y, z) {
        (TernaryOp::Select, Value::Bool(condition), on_true, on_false) => {
            Some(if condition { on_true } else { on_false })
        }
        (TernaryOp::Clamp, Value::Float(x), Value::Float(lo), Value::Float(hi)) => {
            Some(Value::Float(x.min(hi).max(lo)))
        }
        (TernaryOp::Clamp, Value::Int(x), Value::Int(lo), Value::Int(hi)) => Some(Value::Int(x.min(hi).max(lo))),
        (TernaryOp::Lerp, Value::Float(a), Value::Float(b), Value::Float(t)) => Some(Value::Float(a + (b - a) * t)),
        _ => None,
    }
}
