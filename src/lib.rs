//! Expression compiler for a register-based expression VM.
//!
//! Build an expression DAG with [`Ast`], then compile it with a
//! [`Compiler`]:
//!
//! ```
//! use exprc::prelude::*;
//!
//! let mut ast = Ast::new();
//! let x = ast.add_input(StreamDesc::new("x", DataType::FLOAT));
//! let two = ast.create_constant(2.0f32);
//! let sum = ast.create_binary(BinaryOp::Add, x, two);
//! ast.add_output(StreamDesc::new("o", DataType::FLOAT), sum);
//!
//! let program = Compiler::new().compile(&mut ast).unwrap();
//! assert_eq!(program.num_instructions(), 3);
//! ```

pub use exprc_compiler as compiler;
pub use exprc_core as core;

pub use exprc_compiler::{Compiler, CompilerConfig, OpCode, Program};
pub use exprc_core::{Ast, CompileError, ErrorKind};

// Re-export main types
pub mod prelude {
    pub use exprc_compiler::{AstDumper, Compiler, CompilerConfig, DotGraphDumper, OpCode, Pass, Program, TraversalOrder};
    pub use exprc_core::{
        Ast, BinaryOp, CompileError, DataType, ErrorKind, FunctionDesc, NodeId, NodeKind, RegisterType, StreamDesc,
        TernaryOp, UnaryOp, Value,
    };
}
