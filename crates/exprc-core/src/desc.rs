//! Descriptors for program inputs, outputs and external functions.

use std::fmt;

use crate::{DataType, RegisterType};

/// A named input or output stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamDesc {
    pub name: String,
    pub data_type: DataType,
}

impl StreamDesc {
    pub fn new(name: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Register class of the stream.
    pub fn register_type(&self) -> RegisterType {
        self.data_type.register_type
    }
}

impl fmt::Display for StreamDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.data_type)
    }
}

/// Signature of an externally implemented function.
///
/// A function call node carries one descriptor per overload; the type
/// deduction pass picks one of them. Arguments past `num_required_inputs`
/// are optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionDesc {
    pub name: String,
    pub input_types: Vec<RegisterType>,
    pub output_type: RegisterType,
    pub num_required_inputs: usize,
}

impl FunctionDesc {
    /// Create a descriptor where every input is required.
    pub fn new(name: impl Into<String>, input_types: Vec<RegisterType>, output_type: RegisterType) -> Self {
        let num_required_inputs = input_types.len();
        Self {
            name: name.into(),
            input_types,
            output_type,
            num_required_inputs,
        }
    }

    /// Mark only the first `count` inputs as required.
    pub fn with_required_inputs(mut self, count: usize) -> Self {
        self.num_required_inputs = count.min(self.input_types.len());
        self
    }

    /// Name that is unique per overload, e.g. `noise(Float,Float,Int)`.
    pub fn mangled_name(&self) -> String {
        let params: Vec<&str> = self.input_types.iter().map(|t| t.name()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// Number of declared inputs.
    pub fn arity(&self) -> usize {
        self.input_types.len()
    }
}

impl fmt::Display for FunctionDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.mangled_name(), self.output_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangled_name_includes_signature() {
        let desc = FunctionDesc::new("noise", vec![RegisterType::Float, RegisterType::Int], RegisterType::Float);
        assert_eq!(desc.mangled_name(), "noise(Float,Int)");
        assert_eq!(desc.to_string(), "noise(Float,Int) -> Float");
    }

    #[test]
    fn required_inputs_are_clamped() {
        let desc = FunctionDesc::new("f", vec![RegisterType::Float], RegisterType::Float).with_required_inputs(5);
        assert_eq!(desc.num_required_inputs, 1);
        assert_eq!(desc.arity(), 1);
    }

    #[test]
    fn stream_display() {
        let desc = StreamDesc::new("pos", DataType::FLOAT3);
        assert_eq!(desc.to_string(), "pos: Float3");
        assert_eq!(desc.register_type(), RegisterType::Float);
    }
}
