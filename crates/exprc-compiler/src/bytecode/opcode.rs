//! Bytecode operation codes.
//!
//! This module defines the instruction set of the expression VM. Every
//! instruction is a sequence of 32-bit words: the opcode followed by its
//! operands. Operands are register indices unless stated otherwise.
//!
//! ## Layout
//!
//! Opcodes are grouped in fixed ranges. The register-constant binary block
//! mirrors the register-register block at [`OpCode::CONSTANT_OFFSET`], so
//! `AddF as u32 + CONSTANT_OFFSET == AddFC as u32`.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The VM is register based: each instruction reads its operands from
/// registers and writes one target register, except for stores which write
/// an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum OpCode {
    /// Sentinel for combinations without an instruction. Never emitted.
    Nop = 0,

    // =========================================================================
    // Unary: target, operand
    // =========================================================================
    AbsF = 1,
    AbsI,
    SqrtF,
    ExpF,
    LnF,
    Log2F,
    Log2I,
    Log10F,
    Pow2F,
    SinF,
    CosF,
    TanF,
    ASinF,
    ACosF,
    ATanF,
    RoundF,
    FloorF,
    CeilF,
    TruncF,
    NotI,
    NotB,
    /// Int to float.
    IToF,
    /// Float to int, truncating.
    FToI,

    // =========================================================================
    // Binary, register-register: target, left, right
    // =========================================================================
    AddF = 32,
    AddI,
    SubF,
    SubI,
    MulF,
    MulI,
    DivF,
    DivI,
    MinF,
    MinI,
    MaxF,
    MaxI,
    ShlI,
    ShrI,
    AndI,
    XorI,
    OrI,
    EqF,
    EqI,
    EqB,
    NEqF,
    NEqI,
    NEqB,
    LtF,
    LtI,
    LEqF,
    LEqI,
    GtF,
    GtI,
    GEqF,
    GEqI,
    AndB,
    OrB,

    // =========================================================================
    // Binary, register-constant: target, left, constant bits
    // =========================================================================
    AddFC = 96,
    AddIC,
    SubFC,
    SubIC,
    MulFC,
    MulIC,
    DivFC,
    DivIC,
    MinFC,
    MinIC,
    MaxFC,
    MaxIC,
    ShlIC,
    ShrIC,
    AndIC,
    XorIC,
    OrIC,
    EqFC,
    EqIC,
    EqBC,
    NEqFC,
    NEqIC,
    NEqBC,
    LtFC,
    LtIC,
    LEqFC,
    LEqIC,
    GtFC,
    GtIC,
    GEqFC,
    GEqIC,
    AndBC,
    OrBC,

    // =========================================================================
    // Ternary: target, condition, true value, false value
    // =========================================================================
    SelF = 160,
    SelI,
    SelB,

    // =========================================================================
    // Special
    // =========================================================================
    /// Materialize a constant.
    /// Operands: target, constant bits
    MovXC = 176,
    /// Read a float input stream.
    /// Operands: target, input index
    LoadF,
    /// Read an int or bool input stream.
    /// Operands: target, input index
    LoadI,
    /// Write a float output stream.
    /// Operands: output index, source
    StoreF,
    /// Write an int or bool output stream.
    /// Operands: output index, source
    StoreI,
    /// Call an external function.
    /// Operands: function index, target, argument count, arguments...
    Call,
}

/// Coarse instruction shape, which determines the operand layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCategory {
    Nop,
    Unary,
    Binary,
    BinaryWithConstant,
    Ternary,
    Special,
}

impl OpCode {
    /// Distance between a register-register binary opcode and its
    /// register-constant twin.
    pub const CONSTANT_OFFSET: u32 = 64;

    /// Decode an instruction word.
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::try_from(value).ok()
    }

    pub fn category(self) -> OpCategory {
        match u32::from(self) {
            0 => OpCategory::Nop,
            1..32 => OpCategory::Unary,
            32..96 => OpCategory::Binary,
            96..160 => OpCategory::BinaryWithConstant,
            160..176 => OpCategory::Ternary,
            _ => OpCategory::Special,
        }
    }

    /// The register-constant form of a register-register binary opcode.
    pub fn with_constant_right(self) -> Option<Self> {
        if self.category() != OpCategory::Binary {
            return None;
        }
        Self::from_u32(u32::from(self) + Self::CONSTANT_OFFSET)
    }

    /// Number of operand words following the opcode.
    ///
    /// Returns `None` for [`OpCode::Call`], whose length depends on its
    /// argument count operand.
    pub fn operand_count(self) -> Option<usize> {
        match self.category() {
            OpCategory::Nop => Some(0),
            OpCategory::Unary => Some(2),
            OpCategory::Binary | OpCategory::BinaryWithConstant => Some(3),
            OpCategory::Ternary => Some(4),
            OpCategory::Special => match self {
                OpCode::Call => None,
                _ => Some(2),
            },
        }
    }

    /// Get the mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Nop => "NOP",
            OpCode::AbsF => "ABS_F",
            OpCode::AbsI => "ABS_I",
            OpCode::SqrtF => "SQRT_F",
            OpCode::ExpF => "EXP_F",
            OpCode::LnF => "LN_F",
            OpCode::Log2F => "LOG2_F",
            OpCode::Log2I => "LOG2_I",
            OpCode::Log10F => "LOG10_F",
            OpCode::Pow2F => "POW2_F",
            OpCode::SinF => "SIN_F",
            OpCode::CosF => "COS_F",
            OpCode::TanF => "TAN_F",
            OpCode::ASinF => "ASIN_F",
            OpCode::ACosF => "ACOS_F",
            OpCode::ATanF => "ATAN_F",
            OpCode::RoundF => "ROUND_F",
            OpCode::FloorF => "FLOOR_F",
            OpCode::CeilF => "CEIL_F",
            OpCode::TruncF => "TRUNC_F",
            OpCode::NotI => "NOT_I",
            OpCode::NotB => "NOT_B",
            OpCode::IToF => "I_TO_F",
            OpCode::FToI => "F_TO_I",
            OpCode::AddF => "ADD_F",
            OpCode::AddI => "ADD_I",
            OpCode::SubF => "SUB_F",
            OpCode::SubI => "SUB_I",
            OpCode::MulF => "MUL_F",
            OpCode::MulI => "MUL_I",
            OpCode::DivF => "DIV_F",
            OpCode::DivI => "DIV_I",
            OpCode::MinF => "MIN_F",
            OpCode::MinI => "MIN_I",
            OpCode::MaxF => "MAX_F",
            OpCode::MaxI => "MAX_I",
            OpCode::ShlI => "SHL_I",
            OpCode::ShrI => "SHR_I",
            OpCode::AndI => "AND_I",
            OpCode::XorI => "XOR_I",
            OpCode::OrI => "OR_I",
            OpCode::EqF => "EQ_F",
            OpCode::EqI => "EQ_I",
            OpCode::EqB => "EQ_B",
            OpCode::NEqF => "NEQ_F",
            OpCode::NEqI => "NEQ_I",
            OpCode::NEqB => "NEQ_B",
            OpCode::LtF => "LT_F",
            OpCode::LtI => "LT_I",
            OpCode::LEqF => "LEQ_F",
            OpCode::LEqI => "LEQ_I",
            OpCode::GtF => "GT_F",
            OpCode::GtI => "GT_I",
            OpCode::GEqF => "GEQ_F",
            OpCode::GEqI => "GEQ_I",
            OpCode::AndB => "AND_B",
            OpCode::OrB => "OR_B",
            OpCode::AddFC => "ADD_F_C",
            OpCode::AddIC => "ADD_I_C",
            OpCode::SubFC => "SUB_F_C",
            OpCode::SubIC => "SUB_I_C",
            OpCode::MulFC => "MUL_F_C",
            OpCode::MulIC => "MUL_I_C",
            OpCode::DivFC => "DIV_F_C",
            OpCode::DivIC => "DIV_I_C",
            OpCode::MinFC => "MIN_F_C",
            OpCode::MinIC => "MIN_I_C",
            OpCode::MaxFC => "MAX_F_C",
            OpCode::MaxIC => "MAX_I_C",
            OpCode::ShlIC => "SHL_I_C",
            OpCode::ShrIC => "SHR_I_C",
            OpCode::AndIC => "AND_I_C",
            OpCode::XorIC => "XOR_I_C",
            OpCode::OrIC => "OR_I_C",
            OpCode::EqFC => "EQ_F_C",
            OpCode::EqIC => "EQ_I_C",
            OpCode::EqBC => "EQ_B_C",
            OpCode::NEqFC => "NEQ_F_C",
            OpCode::NEqIC => "NEQ_I_C",
            OpCode::NEqBC => "NEQ_B_C",
            OpCode::LtFC => "LT_F_C",
            OpCode::LtIC => "LT_I_C",
            OpCode::LEqFC => "LEQ_F_C",
            OpCode::LEqIC => "LEQ_I_C",
            OpCode::GtFC => "GT_F_C",
            OpCode::GtIC => "GT_I_C",
            OpCode::GEqFC => "GEQ_F_C",
            OpCode::GEqIC => "GEQ_I_C",
            OpCode::AndBC => "AND_B_C",
            OpCode::OrBC => "OR_B_C",
            OpCode::SelF => "SEL_F",
            OpCode::SelI => "SEL_I",
            OpCode::SelB => "SEL_B",
            OpCode::MovXC => "MOV_C",
            OpCode::LoadF => "LOAD_F",
            OpCode::LoadI => "LOAD_I",
            OpCode::StoreF => "STORE_F",
            OpCode::StoreI => "STORE_I",
            OpCode::Call => "CALL",
        }
    }
}
