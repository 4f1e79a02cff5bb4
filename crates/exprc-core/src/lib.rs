//! Core data model for the expression compiler.
//!
//! This crate contains the types shared by the compiler and its callers:
//!
//! - [`ast`]: the node arena ([`Ast`], [`NodeId`], [`Node`], [`NodeKind`])
//!   and operator kinds
//! - [`data_type`]: register classes and vector data types
//! - [`value`]: scalar constants
//! - [`desc`]: input, output and function descriptors
//! - [`signature`]: operator overload tables and overload resolution
//! - [`error`]: the unified [`CompileError`]

pub mod ast;
pub mod data_type;
pub mod desc;
pub mod error;
pub mod signature;
pub mod value;

pub use ast::{Ast, BinaryOp, Node, NodeId, NodeKind, TernaryOp, UnaryOp};
pub use data_type::{COMPONENT_NAMES, DataType, RegisterType};
pub use desc::{FunctionDesc, StreamDesc};
pub use error::{CompileError, ErrorKind};
pub use value::Value;
