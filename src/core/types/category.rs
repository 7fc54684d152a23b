//! Type categories used to classify members for decoding

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed classification of a member's storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    #[default]
    Void,
    Bool,
    Char,
    Int,
    Float,
    Struct,
    Func,
    Array,
    Union,
    Enum,
}

impl TypeCategory {
    /// Name used in diagnostic lines
    pub fn name(&self) -> &'static str {
        match self {
            TypeCategory::Void => "void",
            TypeCategory::Bool => "bool",
            TypeCategory::Char => "char",
            TypeCategory::Int => "int",
            TypeCategory::Float => "float",
            TypeCategory::Struct => "struct",
            TypeCategory::Func => "function",
            TypeCategory::Array => "array",
            TypeCategory::Union => "union",
            TypeCategory::Enum => "enum",
        }
    }

    /// Whether a direct (non-pointer) member of this category decodes to a scalar
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeCategory::Bool | TypeCategory::Char | TypeCategory::Int | TypeCategory::Float
        )
    }

    /// Whether the category describes an aggregate the caller must walk member by member
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            TypeCategory::Struct | TypeCategory::Union | TypeCategory::Array
        )
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
