//! Register classes and (possibly vector) data types.
//!
//! Every node carries a [`DataType`]: a [`RegisterType`] plus a component
//! width of 1 to 4. Widths above 1 only exist before scalarization; the
//! emitted program works exclusively on scalar registers.

use std::fmt;

/// The value category a register holds.
///
/// Variants are ordered by implicit convertibility: a later variant can
/// represent every earlier one without loss of meaning, which is what the
/// overload distance in [`crate::signature`] relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum RegisterType {
    /// Not yet deduced.
    #[default]
    Unknown = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
}

impl RegisterType {
    /// All known (deducible) register types.
    pub const KNOWN: [RegisterType; 3] = [RegisterType::Bool, RegisterType::Int, RegisterType::Float];

    /// Get the human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            RegisterType::Unknown => "Unknown",
            RegisterType::Bool => "Bool",
            RegisterType::Int => "Int",
            RegisterType::Float => "Float",
        }
    }

    /// Check whether the type has been deduced.
    pub fn is_known(self) -> bool {
        self != RegisterType::Unknown
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A register type together with its component count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    pub register_type: RegisterType,
    /// Number of components, 1 to 4.
    pub width: u8,
}

impl DataType {
    /// Maximum number of vector components.
    pub const MAX_WIDTH: u8 = 4;

    pub const UNKNOWN: DataType = DataType::new(RegisterType::Unknown, 1);

    pub const BOOL: DataType = DataType::new(RegisterType::Bool, 1);
    pub const BOOL2: DataType = DataType::new(RegisterType::Bool, 2);
    pub const BOOL3: DataType = DataType::new(RegisterType::Bool, 3);
    pub const BOOL4: DataType = DataType::new(RegisterType::Bool, 4);

    pub const INT: DataType = DataType::new(RegisterType::Int, 1);
    pub const INT2: DataType = DataType::new(RegisterType::Int, 2);
    pub const INT3: DataType = DataType::new(RegisterType::Int, 3);
    pub const INT4: DataType = DataType::new(RegisterType::Int, 4);

    pub const FLOAT: DataType = DataType::new(RegisterType::Float, 1);
    pub const FLOAT2: DataType = DataType::new(RegisterType::Float, 2);
    pub const FLOAT3: DataType = DataType::new(RegisterType::Float, 3);
    pub const FLOAT4: DataType = DataType::new(RegisterType::Float, 4);

    /// Create a data type. The width is clamped to `1..=4`.
    pub const fn new(register_type: RegisterType, width: u8) -> Self {
        let width = if width == 0 {
            1
        } else if width > Self::MAX_WIDTH {
            Self::MAX_WIDTH
        } else {
            width
        };
        Self {
            register_type,
            width,
        }
    }

    /// Create a scalar data type.
    pub const fn scalar_of(register_type: RegisterType) -> Self {
        Self::new(register_type, 1)
    }

    /// The scalar type of a single component.
    pub const fn scalar(self) -> Self {
        Self::new(self.register_type, 1)
    }

    /// Same register type, different width.
    pub const fn with_width(self, width: u8) -> Self {
        Self::new(self.register_type, width)
    }

    /// Same width, different register type.
    pub const fn with_register_type(self, register_type: RegisterType) -> Self {
        Self::new(register_type, self.width)
    }

    pub fn is_vector(self) -> bool {
        self.width > 1
    }

    pub fn is_known(self) -> bool {
        self.register_type.is_known()
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl From<RegisterType> for DataType {
    fn from(register_type: RegisterType) -> Self {
        Self::scalar_of(register_type)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width > 1 && self.is_known() {
            write!(f, "{}{}", self.register_type, self.width)
        } else {
            write!(f, "{}", self.register_type)
        }
    }
}

/// Component names used when splitting vectors into scalars.
pub const COMPONENT_NAMES: [&str; 4] = ["x", "y", "z", "w"];
