//! Serde shapes of the metadata document
//!
//! Every field is optional at this level so that one bad record can be
//! reported and skipped instead of failing the whole document.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Entry of the `base_types` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBaseType {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub signed: Option<bool>,
    #[serde(default)]
    pub endian: Option<String>,
}

/// Entry of the `enums` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEnum {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub base: Option<String>,
}

/// Entry of `user_types`; `size` and `fields` are required
#[derive(Debug, Clone, Deserialize)]
pub struct RawStruct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    pub size: u64,
    pub fields: RawFields,
}

/// Member list, keyed by member name or listed in declaration order
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFields {
    Keyed(Map<String, Value>),
    Listed(Vec<Value>),
}

/// One member entry before its type is resolved
#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(rename = "type", default)]
    pub ty: Option<Value>,
}

/// Type description attached to a member, possibly nested
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawType {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub signed: Option<bool>,
    #[serde(default)]
    pub endian: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub subtype: Option<Box<RawType>>,
    #[serde(rename = "type", default)]
    pub inner: Option<Box<RawType>>,
    #[serde(default)]
    pub bit_position: Option<u32>,
    #[serde(default)]
    pub bit_length: Option<u32>,
}

/// Entry of the `symbols` table
#[derive(Debug, Clone, Deserialize)]
pub struct RawSymbol {
    #[serde(default)]
    pub address: Option<u64>,
    #[serde(rename = "type", default)]
    pub ty: Option<RawType>,
}

impl RawSymbol {
    /// Symbols with no type, or a function type, name code addresses
    pub fn is_function(&self) -> bool {
        match &self.ty {
            None => true,
            Some(ty) => ty.kind.as_deref() == Some("function"),
        }
    }
}
