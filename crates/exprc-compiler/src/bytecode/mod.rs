//! Bytecode types for the expression VM.
//!
//! - [`OpCode`]: instruction set
//! - [`Program`]: compiled instruction stream with its descriptor tables

mod opcode;
mod program;

pub use opcode::{OpCategory, OpCode};
pub use program::Program;
