//! Unified error type for expression compilation.
//!
//! Every pipeline stage returns `Result<_, CompileError>` and the compiler
//! stops at the first failure, so a failed compile never yields a partial
//! program.
//!
//! ## Error Kinds
//!
//! ```text
//! CompileError
//! ├── MalformedInput       - no outputs, missing roots, output replaced by a non-output
//! ├── TypeError            - a node type could not be deduced
//! ├── UnsupportedOperation - no opcode for a node/type combination
//! ├── UndeclaredOutput     - an output writes to a name missing from the output table
//! └── ValidationFailure    - the tree still contains constructs code generation can't handle
//! ```

use thiserror::Error;

use crate::DataType;

/// Errors that abort a compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The AST has no usable roots or a transform broke its structure.
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    /// A node's type could not be deduced.
    #[error("type error at {node}: {message}")]
    TypeError {
        /// Description of the offending node.
        node: String,
        message: String,
    },

    /// No opcode exists for the node and register type.
    #[error("unsupported operation {node} on {data_type}")]
    UnsupportedOperation { node: String, data_type: DataType },

    /// An output node writes to a name that was never declared.
    #[error("output '{name}' is not declared")]
    UndeclaredOutput { name: String },

    /// The validation pass rejected the tree.
    #[error("validation failed at {node}: {message}")]
    ValidationFailure { node: String, message: String },
}

/// Fieldless discriminant of [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    TypeError,
    UnsupportedOperation,
    UndeclaredOutput,
    ValidationFailure,
}

impl CompileError {
    pub fn malformed(message: impl Into<String>) -> Self {
        CompileError::MalformedInput {
            message: message.into(),
        }
    }

    pub fn type_error(node: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::TypeError {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn validation(node: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::ValidationFailure {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::MalformedInput { .. } => ErrorKind::MalformedInput,
            CompileError::TypeError { .. } => ErrorKind::TypeError,
            CompileError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            CompileError::UndeclaredOutput { .. } => ErrorKind::UndeclaredOutput,
            CompileError::ValidationFailure { .. } => ErrorKind::ValidationFailure,
        }
    }
}
