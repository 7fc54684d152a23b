//! Lookup table from metadata `kind` strings to decoding rules
//!
//! The extraction tool may grow new tags; anything missing from the table
//! resolves to `None` and the member is loaded as not decodable.

use crate::core::types::TypeCategory;
use std::collections::HashMap;

/// How a `kind` tag is resolved into a member layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    /// Named reference into the document's base type table
    Base,
    /// One level of indirection to `subtype`
    Pointer,
    /// `count` elements of `subtype`
    Array,
    /// Sub-byte slice of the storage unit given by `type`
    Bitfield,
    /// Named user type, enum or function, resolved by name
    Named(TypeCategory),
    /// Primitive whose size and encoding are given inline
    Primitive(TypeCategory),
}

lazy_static::lazy_static! {
    static ref TAG_TABLE: HashMap<&'static str, TypeTag> = {
        let mut table = HashMap::new();
        table.insert("base", TypeTag::Base);
        table.insert("pointer", TypeTag::Pointer);
        table.insert("array", TypeTag::Array);
        table.insert("bitfield", TypeTag::Bitfield);
        table.insert("struct", TypeTag::Named(TypeCategory::Struct));
        table.insert("class", TypeTag::Named(TypeCategory::Struct));
        table.insert("union", TypeTag::Named(TypeCategory::Union));
        table.insert("enum", TypeTag::Named(TypeCategory::Enum));
        table.insert("function", TypeTag::Named(TypeCategory::Func));
        table.insert("void", TypeTag::Primitive(TypeCategory::Void));
        table.insert("bool", TypeTag::Primitive(TypeCategory::Bool));
        table.insert("char", TypeTag::Primitive(TypeCategory::Char));
        table.insert("int", TypeTag::Primitive(TypeCategory::Int));
        table.insert("float", TypeTag::Primitive(TypeCategory::Float));
        table.insert("double", TypeTag::Primitive(TypeCategory::Float));
        table
    };
}

/// Resolves a `kind` tag; `None` means unrecognized
pub fn lookup_tag(kind: &str) -> Option<TypeTag> {
    TAG_TABLE.get(kind).copied()
}

/// Category of a primitive kind as used by base type entries
pub fn primitive_category(kind: &str) -> Option<TypeCategory> {
    match lookup_tag(kind)? {
        TypeTag::Primitive(category) => Some(category),
        _ => None,
    }
}

/// Endianness tags other than "little" mean big-endian
pub fn is_little_endian(endian: Option<&str>) -> bool {
    endian.map_or(true, |e| e == "little")
}
