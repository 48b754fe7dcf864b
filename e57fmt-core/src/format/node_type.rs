//! Element kinds and their XML type discriminators

/// Kind of an element in the E57 tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum NodeType {
    Structure = 1,
    Vector = 2,
    CompressedVector = 3,
    Integer = 4,
    ScaledInteger = 5,
    Float = 6,
    String = 7,
    Blob = 8,
}

impl NodeType {
    /// Value of the `type` attribute for this kind
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeType::Structure => "Structure",
            NodeType::Vector => "Vector",
            NodeType::CompressedVector => "CompressedVector",
            NodeType::Integer => "Integer",
            NodeType::ScaledInteger => "ScaledInteger",
            NodeType::Float => "Float",
            NodeType::String => "String",
            NodeType::Blob => "Blob",
        }
    }

    /// Parse a `type` attribute value
    pub fn from_type_attribute(value: &str) -> Option<Self> {
        let node_type = match value {
            "Structure" => NodeType::Structure,
            "Vector" => NodeType::Vector,
            "CompressedVector" => NodeType::CompressedVector,
            "Integer" => NodeType::Integer,
            "ScaledInteger" => NodeType::ScaledInteger,
            "Float" => NodeType::Float,
            "String" => NodeType::String,
            "Blob" => NodeType::Blob,
            _ => return None,
        };
        Some(node_type)
    }

    /// Whether elements of this kind hold child elements
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            NodeType::Structure | NodeType::Vector | NodeType::CompressedVector
        )
    }
}

impl core::fmt::Display for NodeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage precision of a Float element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FloatPrecision {
    Single,
    #[default]
    Double,
}

impl FloatPrecision {
    /// Value of the `precision` attribute
    pub const fn as_str(self) -> &'static str {
        match self {
            FloatPrecision::Single => "single",
            FloatPrecision::Double => "double",
        }
    }

    /// Smallest value representable at this precision
    pub const fn default_minimum(self) -> f64 {
        match self {
            FloatPrecision::Single => super::constants::FLOAT_MIN,
            FloatPrecision::Double => super::constants::DOUBLE_MIN,
        }
    }

    /// Largest value representable at this precision
    pub const fn default_maximum(self) -> f64 {
        match self {
            FloatPrecision::Single => super::constants::FLOAT_MAX,
            FloatPrecision::Double => super::constants::DOUBLE_MAX,
        }
    }
}

impl core::fmt::Display for FloatPrecision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
