//! Expression Compiler
//!
//! Compiles expression DAGs built with [`exprc_core::Ast`] into register
//! bytecode for the expression VM.
//!
//! ## Architecture
//!
//! - **Transform**: type deduction, vector lowering, scalarization, constant
//!   folding, unsupported-instruction replacement, CSE and validation, each
//!   a memoized traversal over the DAG
//! - **Code generation**: scheduling, live interval analysis, linear-scan
//!   register allocation and bytecode emission
//!
//! ## Modules
//!
//! - [`bytecode`]: Bytecode types (OpCode, Program)
//! - [`compiler`]: Pipeline driver and configuration
//! - [`dump`]: Debug graph dumps between stages
//! - [`emit`]: Opcode selection and bytecode emission
//! - [`liveness`]: Live interval analysis
//! - [`passes`]: AST transform passes
//! - [`regalloc`]: Linear-scan register allocation
//! - [`schedule`]: Instruction scheduling
//! - [`traversal`]: Shared non-recursive traversal

pub mod bytecode;
pub mod compiler;
pub mod dump;
pub mod emit;
pub mod liveness;
pub mod passes;
pub mod regalloc;
pub mod schedule;
pub mod traversal;

pub use bytecode::{OpCategory, OpCode, Program};
pub use compiler::{Compiler, CompilerConfig};
pub use dump::{AstDumper, DotGraphDumper};
pub use emit::ByteCodeEmitter;
pub use liveness::LiveInterval;
pub use passes::{Pass, TraversalOrder};
pub use regalloc::Allocation;
pub use schedule::Schedule;
pub use traversal::TraversalState;

// Re-export CompileError from core for convenience
pub use exprc_core::CompileError;
