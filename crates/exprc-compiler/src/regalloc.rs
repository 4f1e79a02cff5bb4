//! Linear-scan register allocation.
//!
//! Maps virtual registers to physical registers without spilling; the VM
//! provides as many registers as the program asks for, so the goal is only
//! to ask for few.
//!
//! ## Algorithm
//!
//! 1. Sort intervals by start index. The sort is stable, so intervals
//!    starting at the same instruction keep virtual register order.
//! 2. For each interval, expire every active interval ending at or before
//!    its start and push the freed physical register on the free list.
//! 3. Take the most recently freed register, or `active.len()` when none
//!    is free. Every register below `active.len() + free.len()` is either
//!    active or free, so this is always an unused index.
//!
//! An operand's interval ends at the instruction reading it, which is also
//! where the result's interval starts, so an instruction may write the
//! register its last operand was read from.

use crate::liveness::LiveInterval;

/// Physical register assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    /// Physical register per virtual register.
    physical: Vec<u32>,
    register_count: u32,
}

impl Allocation {
    /// Physical register assigned to a virtual register.
    pub fn physical(&self, virtual_register: u32) -> Option<u32> {
        self.physical.get(virtual_register as usize).copied()
    }

    /// Number of physical registers used: highest index plus one.
    pub fn register_count(&self) -> u32 {
        self.register_count
    }
}

/// Assign physical registers to `intervals`, indexed by virtual register.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn allocate(intervals: &[LiveInterval]) -> Allocation {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|interval| interval.start);

    let mut physical = vec![0u32; intervals.len()];
    let mut active: Vec<LiveInterval> = Vec::new();
    let mut free: Vec<u32> = Vec::new();
    let mut register_count = 0;

    for interval in sorted {
        for index in (0..active.len()).rev() {
            if active[index].end <= interval.start {
                free.push(physical[active[index].virtual_register as usize]);
                active.remove(index);
            }
        }

        let register = free.pop().unwrap_or(active.len() as u32);
        physical[interval.virtual_register as usize] = register;
        register_count = register_count.max(register + 1);
        active.push(interval);
    }

    Allocation {
        physical,
        register_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness::analyze;
    use crate::schedule::{Schedule, build_schedule};
    use crate::traversal::TraversalState;
    use exprc_core::{Ast, BinaryOp, DataType, NodeId, StreamDesc};

    fn interval(virtual_register: u32, start: u32, end: u32) -> LiveInterval {
        let mut ast = Ast::new();
        let node: NodeId = ast.create_constant(0i32);
        LiveInterval {
            virtual_register,
            start,
            end,
            node,
        }
    }

    /// Maximum number of intervals alive at any instruction, counting an
    /// interval as dead at its end since the reader may reuse the register.
    fn peak_liveness(intervals: &[LiveInterval]) -> u32 {
        let last = intervals.iter().map(|i| i.end).max().unwrap_or(0);
        (0..=last)
            .map(|at| {
                intervals
                    .iter()
                    .filter(|i| i.start <= at && (at < i.end || (i.start == i.end && at == i.start)))
                    .count() as u32
            })
            .max()
            .unwrap_or(0)
    }

    fn assert_no_conflicts(intervals: &[LiveInterval], allocation: &Allocation) {
        for a in intervals {
            for b in intervals {
                if a.virtual_register >= b.virtual_register {
                    continue;
                }
                let overlap = a.start < b.end && b.start < a.end;
                if overlap {
                    assert_ne!(
                        allocation.physical(a.virtual_register),
                        allocation.physical(b.virtual_register),
                        "{a:?} and {b:?} share a register"
                    );
                }
            }
        }
    }

    #[test]
    fn freed_registers_are_reused() {
        let intervals = [interval(0, 0, 2), interval(1, 1, 2), interval(2, 2, 3), interval(3, 3, 4)];

        let allocation = allocate(&intervals);

        assert_eq!(allocation.register_count(), 2);
        assert_eq!(allocation.physical(2), Some(0));
        assert_eq!(allocation.physical(3), Some(0));
        assert_no_conflicts(&intervals, &allocation);
    }

    #[test]
    fn overlapping_intervals_get_distinct_registers() {
        let intervals = [interval(0, 0, 5), interval(1, 1, 5), interval(2, 2, 5)];

        let allocation = allocate(&intervals);

        assert_eq!(allocation.register_count(), 3);
        assert_no_conflicts(&intervals, &allocation);
    }

    #[test]
    fn empty_allocation() {
        let allocation = allocate(&[]);
        assert_eq!(allocation.register_count(), 0);
        assert_eq!(allocation.physical(0), None);
    }

    /// Linear congruential generator, enough to vary DAG shapes
    /// reproducibly.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % bound
        }
    }

    fn random_dag(rng: &mut Lcg) -> Ast {
        let mut ast = Ast::new();
        let mut nodes: Vec<NodeId> = (0..2 + rng.next(3))
            .map(|i| ast.add_input(StreamDesc::new(format!("in{i}"), DataType::FLOAT)))
            .collect();

        for _ in 0..1 + rng.next(12) {
            let op = [BinaryOp::Add, BinaryOp::Multiply, BinaryOp::Subtract][rng.next(3)];
            let left = nodes[rng.next(nodes.len())];
            let right = nodes[rng.next(nodes.len())];
            nodes.push(ast.create_binary(op, left, right));
        }

        for i in 0..1 + rng.next(3) {
            let expression = nodes[rng.next(nodes.len())];
            ast.add_output(StreamDesc::new(format!("out{i}"), DataType::FLOAT), expression);
        }
        ast
    }

    #[test]
    fn register_count_matches_peak_liveness() {
        let mut rng = Lcg(0x5eed);
        let mut state = TraversalState::new();
        let mut schedule = Schedule::new();
        let mut intervals = Vec::new();

        for _ in 0..300 {
            let ast = random_dag(&mut rng);
            build_schedule(&ast, &mut state, &mut schedule).unwrap();
            analyze(&ast, &schedule, &mut intervals);

            let allocation = allocate(&intervals);

            assert_eq!(allocation.register_count(), peak_liveness(&intervals), "{intervals:?}");
            assert_no_conflicts(&intervals, &allocation);
        }
    }

    #[test]
    fn shared_product_uses_two_registers() {
        let mut ast = Ast::new();
        let a = ast.add_input(StreamDesc::new("a", DataType::FLOAT));
        let b = ast.add_input(StreamDesc::new("b", DataType::FLOAT));
        let mul = ast.create_binary(BinaryOp::Multiply, a, b);
        let add = ast.create_binary(BinaryOp::Add, mul, mul);
        ast.add_output(StreamDesc::new("o", DataType::FLOAT), add);

        let mut state = TraversalState::new();
        let mut schedule = Schedule::new();
        build_schedule(&ast, &mut state, &mut schedule).unwrap();
        let mut intervals = Vec::new();
        analyze(&ast, &schedule, &mut intervals);

        let allocation = allocate(&intervals);

        assert_eq!(allocation.register_count(), 2);
        assert_eq!(allocation.register_count(), peak_liveness(&intervals));
        assert_no_conflicts(&intervals, &allocation);
    }
}
