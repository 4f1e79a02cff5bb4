//! Instruction scheduling.
//!
//! Linearizes the optimized DAG into the instruction list the emitter walks
//! and assigns virtual registers.
//!
//! ## Algorithm
//!
//! Outputs are traversed last to first. Each output contributes a
//! left-first post-order of its expression, so every instruction comes
//! after the instructions producing its operands. A node reachable through
//! several parents or outputs is scheduled once, at its first occurrence.
//!
//! The constant right operand of a binary operator is not followed: the
//! emitter inlines it into the register-constant instruction form, so it
//! never gets an instruction or a register of its own.
//!
//! Every scheduled node except outputs receives the next virtual register.
//! Outputs write to their stream and produce no value.

use exprc_core::{Ast, CompileError, NodeId, NodeKind};
use rustc_hash::FxHashMap;

use crate::traversal::{TraversalState, post_order};

/// Ordered instruction list with virtual register assignment.
#[derive(Debug, Default)]
pub struct Schedule {
    instructions: Vec<NodeId>,
    registers: FxHashMap<NodeId, u32>,
    num_registers: u32,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.instructions.clear();
        self.registers.clear();
        self.num_registers = 0;
    }

    /// Scheduled nodes in execution order.
    pub fn instructions(&self) -> &[NodeId] {
        &self.instructions
    }

    /// Virtual register holding the value of `node`.
    ///
    /// `None` for outputs, inlined constants and unscheduled nodes.
    pub fn register(&self, node: NodeId) -> Option<u32> {
        self.registers.get(&node).copied()
    }

    /// Number of virtual registers; one per scheduled non-output node.
    pub fn num_registers(&self) -> u32 {
        self.num_registers
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Children of `id` that need a register before `id` executes.
///
/// Like [`Ast::children`], except that the constant right operand of a
/// binary operator is left out because it is encoded inline.
pub fn scheduled_operands(ast: &Ast, id: NodeId) -> &[NodeId] {
    let children = ast.children(id);
    match ast.node(id).kind {
        NodeKind::Binary { operands: [_, right], .. } if ast.is_constant(right) => &children[..1],
        _ => children,
    }
}

/// Build the instruction schedule for `ast` into `schedule`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn build_schedule(ast: &Ast, state: &mut TraversalState, schedule: &mut Schedule) -> Result<(), CompileError> {
    schedule.clear();

    if ast.outputs().is_empty() {
        return Err(CompileError::malformed("the expression has no outputs"));
    }
    if let Some(&root) = ast.outputs().iter().find(|&&root| !ast.node(root).is_output()) {
        return Err(CompileError::malformed(format!(
            "output root {} is not an output node",
            ast.describe(root)
        )));
    }

    post_order(ast, ast.outputs().iter().rev().copied(), scheduled_operands, state);

    for &node in &state.order {
        schedule.instructions.push(node);
        if ast.node(node).is_output() {
            continue;
        }
        schedule.registers.insert(node, schedule.num_registers);
        schedule.num_registers += 1;
    }

    if schedule.instructions.is_empty() {
        return Err(CompileError::malformed("nothing to compile"));
    }
    Ok(())
}
