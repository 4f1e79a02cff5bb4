//! Operator overload tables and overload resolution.
//!
//! Every operator has a small, fixed list of register-class signatures.
//! Resolution picks the signature whose argument types are closest to the
//! operand types, preferring widening conversions over narrowing ones.
//!
//! ## Match distance
//!
//! For each argument the distance is `expected - actual` measured in
//! [`RegisterType`] order. A negative distance would narrow the operand
//! (e.g. Float to Int) and is multiplied by `-NARROWING_PENALTY`. The
//! signature with the smallest total wins; ties keep the earlier signature.

use crate::ast::{BinaryOp, TernaryOp, UnaryOp};
use crate::{FunctionDesc, RegisterType};

/// Cost multiplier for a narrowing conversion step.
pub const NARROWING_PENALTY: u32 = 4;

/// One overload of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub return_type: RegisterType,
    arguments: [RegisterType; 3],
    arity: u8,
}

impl Signature {
    const fn new1(r: RegisterType, a: RegisterType) -> Self {
        Self {
            return_type: r,
            arguments: [a, RegisterType::Unknown, RegisterType::Unknown],
            arity: 1,
        }
    }

    const fn new2(r: RegisterType, a: RegisterType, b: RegisterType) -> Self {
        Self {
            return_type: r,
            arguments: [a, b, RegisterType::Unknown],
            arity: 2,
        }
    }

    const fn new3(r: RegisterType, a: RegisterType, b: RegisterType, c: RegisterType) -> Self {
        Self {
            return_type: r,
            arguments: [a, b, c],
            arity: 3,
        }
    }

    /// Expected argument types.
    pub fn arguments(&self) -> &[RegisterType] {
        &self.arguments[..self.arity as usize]
    }

    /// Expected type of one argument.
    pub fn argument(&self, index: usize) -> RegisterType {
        self.arguments().get(index).copied().unwrap_or_default()
    }
}

use RegisterType::{Bool as B, Float as F, Int as I};

const FLOAT1: &[Signature] = &[Signature::new1(F, F)];
const FLOAT_INT1: &[Signature] = &[Signature::new1(F, F), Signature::new1(I, I)];
const INT1: &[Signature] = &[Signature::new1(I, I)];
const BOOL1: &[Signature] = &[Signature::new1(B, B)];

const FLOAT2: &[Signature] = &[Signature::new2(F, F, F)];
const FLOAT_INT2: &[Signature] = &[Signature::new2(F, F, F), Signature::new2(I, I, I)];
const INT2: &[Signature] = &[Signature::new2(I, I, I)];
const BOOL2: &[Signature] = &[Signature::new2(B, B, B)];
const EQUALITY: &[Signature] = &[
    Signature::new2(B, F, F),
    Signature::new2(B, I, I),
    Signature::new2(B, B, B),
];
const ORDERING: &[Signature] = &[Signature::new2(B, F, F), Signature::new2(B, I, I)];

const CLAMP: &[Signature] = &[Signature::new3(F, F, F, F), Signature::new3(I, I, I, I)];
const SELECT: &[Signature] = &[
    Signature::new3(F, B, F, F),
    Signature::new3(I, B, I, I),
    Signature::new3(B, B, B, B),
];
const LERP: &[Signature] = &[Signature::new3(F, F, F, F)];

/// Overloads of a unary operator.
///
/// [`UnaryOp::TypeConversion`] has no table: its return type is fixed at
/// creation and it accepts any operand.
pub fn unary_signatures(op: UnaryOp) -> &'static [Signature] {
    match op {
        UnaryOp::Negate | UnaryOp::Absolute | UnaryOp::Saturate | UnaryOp::Log2 | UnaryOp::Pow2 => FLOAT_INT1,
        UnaryOp::Sqrt
        | UnaryOp::Exp
        | UnaryOp::Ln
        | UnaryOp::Log10
        | UnaryOp::Sin
        | UnaryOp::Cos
        | UnaryOp::Tan
        | UnaryOp::ASin
        | UnaryOp::ACos
        | UnaryOp::ATan
        | UnaryOp::RadToDeg
        | UnaryOp::DegToRad
        | UnaryOp::Round
        | UnaryOp::Floor
        | UnaryOp::Ceil
        | UnaryOp::Trunc
        | UnaryOp::Frac
        | UnaryOp::Length
        | UnaryOp::Normalize => FLOAT1,
        UnaryOp::BitwiseNot => INT1,
        UnaryOp::LogicalNot | UnaryOp::All | UnaryOp::Any => BOOL1,
        UnaryOp::TypeConversion => &[],
    }
}

/// Overloads of a binary operator.
pub fn binary_signatures(op: BinaryOp) -> &'static [Signature] {
    match op {
        BinaryOp::Add
        | BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Modulo
        | BinaryOp::Pow
        | BinaryOp::Min
        | BinaryOp::Max
        | BinaryOp::Dot => FLOAT_INT2,
        BinaryOp::Log | BinaryOp::Cross => FLOAT2,
        BinaryOp::BitshiftLeft
        | BinaryOp::BitshiftRight
        | BinaryOp::BitwiseAnd
        | BinaryOp::BitwiseXor
        | BinaryOp::BitwiseOr => INT2,
        BinaryOp::Equal | BinaryOp::NotEqual => EQUALITY,
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => ORDERING,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => BOOL2,
    }
}

/// Overloads of a ternary operator.
pub fn ternary_signatures(op: TernaryOp) -> &'static [Signature] {
    match op {
        TernaryOp::Clamp => CLAMP,
        TernaryOp::Select => SELECT,
        TernaryOp::Lerp => LERP,
    }
}

/// Distance between operand types and expected argument types.
///
/// Returns `None` if an operand type is still unknown or if fewer operands
/// than `required` were supplied. Extra operands beyond `expected` are
/// ignored.
pub fn match_distance(actual: &[RegisterType], expected: &[RegisterType], required: usize) -> Option<u32> {
    if actual.len() < required {
        return None;
    }

    let mut distance = 0u32;
    for (&actual, &expected) in actual.iter().zip(expected) {
        if !actual.is_known() {
            return None;
        }
        let delta = expected as i32 - actual as i32;
        distance += if delta < 0 {
            delta.unsigned_abs() * NARROWING_PENALTY
        } else {
            delta as u32
        };
    }
    Some(distance)
}

/// Index of the best matching operator signature.
pub fn resolve_operator(signatures: &[Signature], operands: &[RegisterType]) -> Option<usize> {
    best_match(signatures.iter().map(|sig| match_distance(operands, sig.arguments(), sig.arguments().len())))
}

/// Index of the best matching function overload.
pub fn resolve_function(functions: &[FunctionDesc], arguments: &[RegisterType]) -> Option<usize> {
    best_match(
        functions
            .iter()
            .map(|desc| match_distance(arguments, &desc.input_types, desc.num_required_inputs)),
    )
}

fn best_match(distances: impl Iterator<Item = Option<u32>>) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (index, distance) in distances.enumerate() {
        let Some(distance) = distance else { continue };
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}
