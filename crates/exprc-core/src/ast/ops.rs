//! Operator kinds for unary, binary and ternary nodes.

use std::fmt;

// ============================================================================
// Unary operators
// ============================================================================

/// Operators taking one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Absolute,
    Saturate,
    Sqrt,
    Exp,
    Ln,
    Log2,
    Log10,
    Pow2,
    Sin,
    Cos,
    Tan,
    ASin,
    ACos,
    ATan,
    RadToDeg,
    DegToRad,
    Round,
    Floor,
    Ceil,
    Trunc,
    Frac,
    BitwiseNot,
    LogicalNot,
    /// Conversion to the node's own return type.
    TypeConversion,

    // Vector operators
    /// Euclidean length of a vector.
    Length,
    /// Vector divided by its length.
    Normalize,
    /// True if every component is true.
    All,
    /// True if any component is true.
    Any,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Negate => "Negate",
            UnaryOp::Absolute => "Absolute",
            UnaryOp::Saturate => "Saturate",
            UnaryOp::Sqrt => "Sqrt",
            UnaryOp::Exp => "Exp",
            UnaryOp::Ln => "Ln",
            UnaryOp::Log2 => "Log2",
            UnaryOp::Log10 => "Log10",
            UnaryOp::Pow2 => "Pow2",
            UnaryOp::Sin => "Sin",
            UnaryOp::Cos => "Cos",
            UnaryOp::Tan => "Tan",
            UnaryOp::ASin => "ASin",
            UnaryOp::ACos => "ACos",
            UnaryOp::ATan => "ATan",
            UnaryOp::RadToDeg => "RadToDeg",
            UnaryOp::DegToRad => "DegToRad",
            UnaryOp::Round => "Round",
            UnaryOp::Floor => "Floor",
            UnaryOp::Ceil => "Ceil",
            UnaryOp::Trunc => "Trunc",
            UnaryOp::Frac => "Frac",
            UnaryOp::BitwiseNot => "BitwiseNot",
            UnaryOp::LogicalNot => "LogicalNot",
            UnaryOp::TypeConversion => "TypeConversion",
            UnaryOp::Length => "Length",
            UnaryOp::Normalize => "Normalize",
            UnaryOp::All => "All",
            UnaryOp::Any => "Any",
        }
    }

    /// Operators that mix vector components instead of applying per component.
    pub fn is_vector_op(self) -> bool {
        matches!(self, UnaryOp::Length | UnaryOp::Normalize | UnaryOp::All | UnaryOp::Any)
    }

    /// Operators that collapse a vector into a scalar.
    pub fn is_reduction(self) -> bool {
        matches!(self, UnaryOp::Length | UnaryOp::All | UnaryOp::Any)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Binary operators
// ============================================================================

/// Operators taking two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// Logarithm of the left operand to the base of the right operand.
    Log,
    Pow,
    Min,
    Max,
    BitshiftLeft,
    BitshiftRight,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,

    // Vector operators
    Dot,
    Cross,
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Subtract => "Subtract",
            BinaryOp::Multiply => "Multiply",
            BinaryOp::Divide => "Divide",
            BinaryOp::Modulo => "Modulo",
            BinaryOp::Log => "Log",
            BinaryOp::Pow => "Pow",
            BinaryOp::Min => "Min",
            BinaryOp::Max => "Max",
            BinaryOp::BitshiftLeft => "BitshiftLeft",
            BinaryOp::BitshiftRight => "BitshiftRight",
            BinaryOp::BitwiseAnd => "BitwiseAnd",
            BinaryOp::BitwiseXor => "BitwiseXor",
            BinaryOp::BitwiseOr => "BitwiseOr",
            BinaryOp::Equal => "Equal",
            BinaryOp::NotEqual => "NotEqual",
            BinaryOp::Less => "Less",
            BinaryOp::LessEqual => "LessEqual",
            BinaryOp::Greater => "Greater",
            BinaryOp::GreaterEqual => "GreaterEqual",
            BinaryOp::LogicalAnd => "LogicalAnd",
            BinaryOp::LogicalOr => "LogicalOr",
            BinaryOp::Dot => "Dot",
            BinaryOp::Cross => "Cross",
        }
    }

    /// Operators where `a op b == b op a`.
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Multiply
                | BinaryOp::Min
                | BinaryOp::Max
                | BinaryOp::BitwiseAnd
                | BinaryOp::BitwiseXor
                | BinaryOp::BitwiseOr
                | BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LogicalAnd
                | BinaryOp::LogicalOr
                | BinaryOp::Dot
        )
    }

    /// The operator that yields the same result with swapped operands, if any.
    ///
    /// Commutative operators mirror to themselves, ordered comparisons flip.
    pub fn mirrored(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Less => Some(BinaryOp::Greater),
            BinaryOp::LessEqual => Some(BinaryOp::GreaterEqual),
            BinaryOp::Greater => Some(BinaryOp::Less),
            BinaryOp::GreaterEqual => Some(BinaryOp::LessEqual),
            op if op.is_commutative() => Some(op),
            _ => None,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    pub fn is_vector_op(self) -> bool {
        matches!(self, BinaryOp::Dot | BinaryOp::Cross)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Ternary operators
// ============================================================================

/// Operators taking three operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TernaryOp {
    /// `clamp(x, low, high)`
    Clamp,
    /// `condition ? a : b`
    Select,
    /// `a + (b - a) * t`
    Lerp,
}

impl TernaryOp {
    pub fn name(self) -> &'static str {
        match self {
            TernaryOp::Clamp => "Clamp",
            TernaryOp::Select => "Select",
            TernaryOp::Lerp => "Lerp",
        }
    }
}

impl fmt::Display for TernaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
