//! Compiled expression program.
//!
//! A `Program` is the output of a successful compile: the instruction word
//! stream plus the input, output and function tables the VM binds against.

use std::fmt::Write as _;

use exprc_core::{FunctionDesc, StreamDesc};

use super::{OpCategory, OpCode};

/// A compiled expression.
///
/// Programs are immutable once returned by the compiler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    byte_code: Vec<u32>,
    inputs: Vec<StreamDesc>,
    outputs: Vec<StreamDesc>,
    /// Function descriptors; their names are mangled signatures.
    functions: Vec<FunctionDesc>,
    num_temp_registers: u32,
    num_instructions: u32,
}

impl Program {
    pub(crate) fn new(
        byte_code: Vec<u32>,
        inputs: Vec<StreamDesc>,
        outputs: Vec<StreamDesc>,
        functions: Vec<FunctionDesc>,
        num_temp_registers: u32,
        num_instructions: u32,
    ) -> Self {
        Self {
            byte_code,
            inputs,
            outputs,
            functions,
            num_temp_registers,
            num_instructions,
        }
    }

    /// Get the instruction words.
    pub fn byte_code(&self) -> &[u32] {
        &self.byte_code
    }

    /// Input stream table. Load instructions index into it.
    pub fn inputs(&self) -> &[StreamDesc] {
        &self.inputs
    }

    /// Output stream table. Store instructions index into it.
    pub fn outputs(&self) -> &[StreamDesc] {
        &self.outputs
    }

    /// Function table. Call instructions index into it.
    pub fn functions(&self) -> &[FunctionDesc] {
        &self.functions
    }

    /// Number of registers the VM must provide.
    pub fn num_temp_registers(&self) -> u32 {
        self.num_temp_registers
    }

    /// Number of instructions, including output stores.
    pub fn num_instructions(&self) -> u32 {
        self.num_instructions
    }

    /// Check if the program contains no code.
    pub fn is_empty(&self) -> bool {
        self.byte_code.is_empty()
    }

    /// Decode the instruction stream into `(word offset, opcode)` pairs.
    ///
    /// Stops at the first word that is not a valid opcode.
    pub fn instructions(&self) -> Vec<(usize, OpCode)> {
        let mut result = Vec::new();
        let mut offset = 0;

        while let Some(&word) = self.byte_code.get(offset) {
            let Some(op) = OpCode::from_u32(word) else { break };
            result.push((offset, op));
            offset += 1 + self.operand_words(op, offset);
        }

        result
    }

    /// Extract all opcodes, skipping operands.
    ///
    /// This is useful for testing bytecode sequences without worrying about
    /// register assignment.
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.instructions().into_iter().map(|(_, op)| op).collect()
    }

    /// Check that the program contains exactly the given opcode sequence.
    ///
    /// Panics with a descriptive message if the sequences don't match.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    fn operand_words(&self, op: OpCode, offset: usize) -> usize {
        match op.operand_count() {
            Some(count) => count,
            // function index, target, argument count, arguments
            None => 3 + self.byte_code.get(offset + 3).copied().unwrap_or(0) as usize,
        }
    }

    /// Render a human-readable listing.
    ///
    /// ```text
    /// 0000 LOAD_F      r0, i0 (x)
    /// 0003 ADD_F_C     r0, r0, 2.0
    /// 0007 STORE_F     o0 (o), r0
    /// ```
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (offset, op) in self.instructions() {
            let words = &self.byte_code[offset + 1..];
            let word = |i: usize| words.get(i).copied().unwrap_or(0);
            let operands = match op.category() {
                OpCategory::Nop => String::new(),
                OpCategory::Unary => format!("r{}, r{}", word(0), word(1)),
                OpCategory::Binary => format!("r{}, r{}, r{}", word(0), word(1), word(2)),
                OpCategory::BinaryWithConstant => {
                    format!("r{}, r{}, {}", word(0), word(1), format_constant(op, word(2)))
                }
                OpCategory::Ternary => format!("r{}, r{}, r{}, r{}", word(0), word(1), word(2), word(3)),
                OpCategory::Special => match op {
                    OpCode::MovXC => format!("r{}, 0x{:08X}", word(0), word(1)),
                    OpCode::LoadF | OpCode::LoadI => {
                        format!("r{}, i{} ({})", word(0), word(1), stream_name(&self.inputs, word(1)))
                    }
                    OpCode::StoreF | OpCode::StoreI => {
                        format!("o{} ({}), r{}", word(0), stream_name(&self.outputs, word(0)), word(1))
                    }
                    _ => {
                        let name = self
                            .functions
                            .get(word(0) as usize)
                            .map(|f| f.name.as_str())
                            .unwrap_or("?");
                        let args: Vec<String> = (0..word(2) as usize).map(|i| format!("r{}", word(3 + i))).collect();
                        format!("r{}, {}({})", word(1), name, args.join(", "))
                    }
                },
            };
            let _ = writeln!(out, "{offset:04} {:<11} {operands}", op.name());
        }
        out
    }
}

fn stream_name(table: &[StreamDesc], index: u32) -> &str {
    table.get(index as usize).map(|s| s.name.as_str()).unwrap_or("?")
}

fn format_constant(op: OpCode, bits: u32) -> String {
    match op {
        OpCode::AddFC
        | OpCode::SubFC
        | OpCode::MulFC
        | OpCode::DivFC
        | OpCode::MinFC
        | OpCode::MaxFC
        | OpCode::EqFC
        | OpCode::NEqFC
        | OpCode::LtFC
        | OpCode::LEqFC
        | OpCode::GtFC
        | OpCode::GEqFC => format!("{:?}", f32::from_bits(bits)),
        OpCode::EqBC | OpCode::NEqBC | OpCode::AndBC | OpCode::OrBC => (bits != 0).to_string(),
        _ => (bits as i32).to_string(),
    }
}
