//! Constant values.

use std::fmt;

use crate::RegisterType;

/// A scalar constant. All values fit into one 32-bit register word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl Value {
    /// Register class of this value.
    pub fn register_type(self) -> RegisterType {
        match self {
            Value::Bool(_) => RegisterType::Bool,
            Value::Int(_) => RegisterType::Int,
            Value::Float(_) => RegisterType::Float,
        }
    }

    /// The zero value of a register class.
    ///
    /// Returns `None` for [`RegisterType::Unknown`].
    pub fn zero(register_type: RegisterType) -> Option<Value> {
        match register_type {
            RegisterType::Bool => Some(Value::Bool(false)),
            RegisterType::Int => Some(Value::Int(0)),
            RegisterType::Float => Some(Value::Float(0.0)),
            RegisterType::Unknown => None,
        }
    }

    /// The one value of a register class (`true` for bools).
    pub fn one(register_type: RegisterType) -> Option<Value> {
        match register_type {
            RegisterType::Bool => Some(Value::Bool(true)),
            RegisterType::Int => Some(Value::Int(1)),
            RegisterType::Float => Some(Value::Float(1.0)),
            RegisterType::Unknown => None,
        }
    }

    /// Convert to another register class with VM conversion semantics.
    ///
    /// Float to int truncates toward zero (saturating at the bounds), numbers
    /// convert to bool by comparing against zero, bools become 0 or 1.
    pub fn convert(self, target: RegisterType) -> Option<Value> {
        let converted = match target {
            RegisterType::Bool => Value::Bool(self.as_bool()),
            RegisterType::Int => Value::Int(self.as_i32()),
            RegisterType::Float => Value::Float(self.as_f32()),
            RegisterType::Unknown => return None,
        };
        Some(converted)
    }

    pub fn as_bool(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Int(i) => i != 0,
            Value::Float(f) => f != 0.0,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Value::Bool(b) => b as i32,
            Value::Int(i) => i,
            Value::Float(f) => f as i32,
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            Value::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => i as f32,
            Value::Float(f) => f,
        }
    }

    /// The 32-bit word this constant is encoded as in bytecode.
    ///
    /// Floats use their IEEE bit pattern, ints their two's complement value
    /// and bools are all-ones for `true`, zero for `false`.
    pub fn to_bits(self) -> u32 {
        match self {
            Value::Bool(b) => {
                if b {
                    u32::MAX
                } else {
                    0
                }
            }
            Value::Int(i) => i as u32,
            Value::Float(f) => f.to_bits(),
        }
    }

    /// Check whether the value equals zero (or `false`).
    pub fn is_zero(self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Int(i) => i == 0,
            Value::Float(f) => f == 0.0,
        }
    }

    /// Check whether the value equals one (or `true`).
    pub fn is_one(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Int(i) => i == 1,
            Value::Float(f) => f == 1.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}
