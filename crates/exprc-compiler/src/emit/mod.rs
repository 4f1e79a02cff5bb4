//! Bytecode emission.
//!
//! The [`ByteCodeEmitter`] walks the scheduled instructions, selects an
//! opcode for each (see [`select`]), encodes its operands with the
//! allocated physical registers and assembles the [`Program`].
//!
//! ## Encoding
//!
//! ```text
//! unary     op, target, operand
//! binary    op, target, left, right register | constant bits
//! ternary   op, target, first, second, third
//! constant  MOV_C, target, constant bits
//! input     LOAD_*, target, input slot
//! output    STORE_*, output slot, source
//! call      CALL, function slot, target, argument count, arguments...
//! ```
//!
//! Output slots come from the declared output table. Inputs are looked up
//! in the declared input table; inputs missing from it are appended on
//! first use. Functions are deduplicated program-wide by mangled name.

mod select;

pub use select::{binary_opcode, select_opcode, ternary_opcode, unary_opcode};

use exprc_core::{Ast, CompileError, FunctionDesc, NodeId, NodeKind, StreamDesc};
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::bytecode::{OpCode, Program};
use crate::regalloc::Allocation;
use crate::schedule::Schedule;

/// Assembles programs from scheduled, register-allocated instructions.
///
/// The slot tables are scratch state reused across compiles.
#[derive(Debug, Default)]
pub struct ByteCodeEmitter {
    byte_code: Vec<u32>,
    inputs: Vec<StreamDesc>,
    functions: Vec<FunctionDesc>,
    input_slots: FxHashMap<String, u32>,
    output_slots: FxHashMap<String, u32>,
    function_slots: FxHashMap<String, u32>,
}

impl ByteCodeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&mut self) {
        self.byte_code.clear();
        self.inputs.clear();
        self.functions.clear();
        self.input_slots.clear();
        self.output_slots.clear();
        self.function_slots.clear();
    }

    /// Emit the program for `schedule`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit(&mut self, ast: &Ast, schedule: &Schedule, allocation: &Allocation) -> Result<Program, CompileError> {
        self.clear();

        for &input in ast.inputs() {
            if let NodeKind::Input(desc) = &ast.node(input).kind
                && !self.input_slots.contains_key(&desc.name)
            {
                self.add_input(desc);
            }
        }
        for (slot, desc) in ast.declared_outputs().iter().enumerate() {
            self.output_slots.entry(desc.name.clone()).or_insert(slot as u32);
        }

        for &id in schedule.instructions() {
            self.emit_instruction(ast, schedule, allocation, id)?;
        }

        Ok(Program::new(
            std::mem::take(&mut self.byte_code),
            std::mem::take(&mut self.inputs),
            ast.declared_outputs().to_vec(),
            std::mem::take(&mut self.functions),
            allocation.register_count(),
            schedule.len() as u32,
        ))
    }

    fn emit_instruction(
        &mut self,
        ast: &Ast,
        schedule: &Schedule,
        allocation: &Allocation,
        id: NodeId,
    ) -> Result<(), CompileError> {
        let node = ast.node(id);
        if !node.return_type.is_known() {
            return Err(CompileError::type_error(ast.describe(id), "type is unknown at code generation"));
        }

        let opcode = select_opcode(ast, id);
        if opcode == OpCode::Nop {
            return Err(CompileError::UnsupportedOperation {
                node: ast.describe(id),
                data_type: node.return_type,
            });
        }

        let register = |operand: NodeId| -> Result<u32, CompileError> {
            schedule
                .register(operand)
                .and_then(|virtual_register| allocation.physical(virtual_register))
                .ok_or_else(|| CompileError::malformed(format!("{} has no register", ast.describe(operand))))
        };

        self.byte_code.push(opcode.into());
        match &node.kind {
            NodeKind::Constant(value) => {
                self.byte_code.push(register(id)?);
                self.byte_code.push(value.to_bits());
            }
            NodeKind::Input(desc) => {
                let slot = match self.input_slots.get(&desc.name) {
                    Some(&slot) => slot,
                    None => {
                        warn!(input = %desc.name, "input is not declared, appending it to the input table");
                        self.add_input(desc)
                    }
                };
                self.byte_code.push(register(id)?);
                self.byte_code.push(slot);
            }
            NodeKind::Output { desc, expression } => {
                let slot = self
                    .output_slots
                    .get(&desc.name)
                    .copied()
                    .ok_or_else(|| CompileError::UndeclaredOutput {
                        name: desc.name.clone(),
                    })?;
                self.byte_code.push(slot);
                self.byte_code.push(register(*expression)?);
            }
            NodeKind::Unary { operand, .. } => {
                self.byte_code.push(register(id)?);
                self.byte_code.push(register(*operand)?);
            }
            NodeKind::Binary { operands: [left, right], .. } => {
                self.byte_code.push(register(id)?);
                self.byte_code.push(register(*left)?);
                match ast.constant_value(*right) {
                    Some(value) => self.byte_code.push(value.to_bits()),
                    None => self.byte_code.push(register(*right)?),
                }
            }
            NodeKind::Ternary { operands, .. } => {
                self.byte_code.push(register(id)?);
                for &operand in operands {
                    self.byte_code.push(register(operand)?);
                }
            }
            NodeKind::FunctionCall { arguments, .. } => {
                let function = node
                    .selected_function()
                    .ok_or_else(|| CompileError::type_error(ast.describe(id), "no overload selected"))?;
                let slot = self.function_slot(function);
                self.byte_code.push(slot);
                self.byte_code.push(register(id)?);
                self.byte_code.push(arguments.len() as u32);
                for &argument in arguments {
                    self.byte_code.push(register(argument)?);
                }
            }
            NodeKind::Constructor { .. } | NodeKind::Swizzle { .. } => {
                return Err(CompileError::UnsupportedOperation {
                    node: ast.describe(id),
                    data_type: node.return_type,
                });
            }
        }
        Ok(())
    }

    fn add_input(&mut self, desc: &StreamDesc) -> u32 {
        let slot = self.inputs.len() as u32;
        self.input_slots.insert(desc.name.clone(), slot);
        self.inputs.push(desc.clone());
        slot
    }

    fn function_slot(&mut self, function: &FunctionDesc) -> u32 {
        let mangled = function.mangled_name();
        if let Some(&slot) = self.function_slots.get(&mangled) {
            return slot;
        }
        let slot = self.functions.len() as u32;
        let mut desc = function.clone();
        desc.name = mangled.clone();
        self.function_slots.insert(mangled, slot);
        self.functions.push(desc);
        slot
    }
}
