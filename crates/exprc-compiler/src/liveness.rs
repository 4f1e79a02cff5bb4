//! Live interval analysis.
//!
//! Each virtual register is live from the instruction that defines it to
//! the last instruction reading it. Intervals are inclusive instruction
//! indices into the schedule.

use exprc_core::{Ast, NodeId};

use crate::schedule::{Schedule, scheduled_operands};

/// Inclusive range of instruction indices a virtual register is live for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveInterval {
    pub virtual_register: u32,
    pub start: u32,
    pub end: u32,
    /// Node whose value the register holds.
    pub node: NodeId,
}

impl LiveInterval {
    fn widen(&mut self, index: u32) {
        self.start = self.start.min(index);
        self.end = self.end.max(index);
    }
}

/// Compute the live interval of every virtual register in `schedule`.
///
/// `intervals` is cleared and refilled, indexed by virtual register.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn analyze(ast: &Ast, schedule: &Schedule, intervals: &mut Vec<LiveInterval>) {
    intervals.clear();

    for (index, &node) in schedule.instructions().iter().enumerate() {
        if let Some(register) = schedule.register(node) {
            debug_assert_eq!(register as usize, intervals.len());
            intervals.push(LiveInterval {
                virtual_register: register,
                start: index as u32,
                end: index as u32,
                node,
            });
        }
    }

    for (index, &node) in schedule.instructions().iter().enumerate() {
        for &operand in scheduled_operands(ast, node) {
            if let Some(register) = schedule.register(operand) {
                intervals[register as usize].widen(index as u32);
            }
        }
    }
}
