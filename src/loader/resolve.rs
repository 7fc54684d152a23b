//! Resolution of member type descriptions into layout descriptors

use super::document::{RawBaseType, RawEnum, RawType};
use super::tags::{self, TypeTag};
use crate::core::types::{
    Bitfield, MemberDescriptor, QueryResult, TypeCategory, NONE_SENTINEL, UNKNOWN_SENTINEL,
};
use crate::registry::TypeRegistry;
use std::collections::HashMap;

/// Pointer width and byte order of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerLayout {
    pub size_bytes: u64,
    pub is_little_endian: bool,
}

/// Fully resolved layout of a type description
#[derive(Debug, Clone)]
pub(crate) struct ResolvedType {
    pub name: String,
    pub category: TypeCategory,
    pub size_bytes: u64,
    pub is_little_endian: bool,
    pub is_signed: bool,
    pub indirection: u8,
    pub target_name: String,
    pub element: Option<Box<ResolvedType>>,
    pub bitfield: Option<Bitfield>,
    pub invalid_reason: Option<String>,
}

impl ResolvedType {
    fn new(name: impl Into<String>, category: TypeCategory) -> Self {
        ResolvedType {
            name: name.into(),
            category,
            size_bytes: 0,
            is_little_endian: true,
            is_signed: false,
            indirection: 0,
            target_name: NONE_SENTINEL.to_string(),
            element: None,
            bitfield: None,
            invalid_reason: None,
        }
    }

    fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut resolved = Self::new(name, TypeCategory::Void);
        resolved.invalid_reason = Some(reason.into());
        resolved
    }

    /// Applies inline size/signedness/endianness given next to the tag
    fn with_overrides(mut self, ty: &RawType) -> Self {
        if let Some(size) = ty.size {
            self.size_bytes = size;
        }
        if let Some(signed) = ty.signed {
            self.is_signed = signed;
        }
        if ty.endian.is_some() {
            self.is_little_endian = tags::is_little_endian(ty.endian.as_deref());
        }
        self
    }

    /// Builds the member descriptor, enforcing the array invariant
    pub fn into_member(self, name: String, offset_bytes: u64) -> QueryResult<MemberDescriptor> {
        let mut rdt = match &self.element {
            Some(element) if self.invalid_reason.is_none() => MemberDescriptor::array(
                name,
                self.size_bytes,
                element.name.clone(),
                element.category,
                element.size_bytes,
            )?,
            // Not decodable anyway; keep the layout without enforcing the invariant.
            Some(element) => {
                let mut rdt = MemberDescriptor::new(name).with_category(TypeCategory::Array);
                rdt.size_bytes = self.size_bytes;
                rdt.array_element_name = element.name.clone();
                rdt.array_element_category = element.category;
                rdt.array_element_size_bytes = element.size_bytes;
                rdt
            }
            None => {
                let mut rdt = MemberDescriptor::new(name);
                rdt.category = self.category;
                rdt.size_bytes = self.size_bytes;
                rdt
            }
        };

        rdt.offset_bytes = offset_bytes;
        rdt.is_little_endian = self.is_little_endian;
        rdt.is_signed = self.is_signed;
        rdt.is_pointer = self.indirection == 1;
        rdt.is_double_pointer = self.indirection == 2;
        rdt.pointer_target_name = self.target_name;
        rdt.bitfield = self.bitfield;
        rdt.is_valid = self.invalid_reason.is_none();
        Ok(rdt)
    }
}

/// Read-only view of the tables a member description may refer to
pub(crate) struct Resolver<'a> {
    pub base_types: &'a HashMap<String, RawBaseType>,
    pub enums: &'a HashMap<String, RawEnum>,
    pub user_sizes: &'a HashMap<String, u64>,
    pub registry: &'a TypeRegistry,
    pub pointer: PointerLayout,
}

impl<'a> Resolver<'a> {
    pub fn resolve(&self, ty: &RawType) -> ResolvedType {
        let kind = match ty.kind.as_deref() {
            Some(kind) => kind,
            None => return ResolvedType::invalid(UNKNOWN_SENTINEL, "missing type kind"),
        };
        let name = ty.name.clone().unwrap_or_else(|| kind.to_string());

        match tags::lookup_tag(kind) {
            Some(TypeTag::Base) => self.resolve_base(&name).with_overrides(ty),
            Some(TypeTag::Primitive(category)) => {
                let resolved = ResolvedType::new(name, category).with_overrides(ty);
                if category != TypeCategory::Void && ty.size.is_none() {
                    return ResolvedType {
                        invalid_reason: Some(format!("primitive '{}' without size", kind)),
                        ..resolved
                    };
                }
                resolved
            }
            Some(TypeTag::Named(category)) => self.resolve_named(name, category).with_overrides(ty),
            Some(TypeTag::Pointer) => self.resolve_pointer(ty),
            Some(TypeTag::Array) => self.resolve_array(ty),
            Some(TypeTag::Bitfield) => self.resolve_bitfield(ty),
            None => ResolvedType::invalid(name, format!("unrecognized type kind '{}'", kind)),
        }
    }

    fn resolve_base(&self, name: &str) -> ResolvedType {
        let base = match self.base_types.get(name) {
            Some(base) => base,
            None => return ResolvedType::invalid(name, format!("unknown base type '{}'", name)),
        };

        let kind = base.kind.as_deref().unwrap_or_default();
        let category = match tags::primitive_category(kind) {
            Some(category) => category,
            None => {
                return ResolvedType::invalid(
                    name,
                    format!("base type '{}' has unsupported kind '{}'", name, kind),
                )
            }
        };

        let mut resolved = ResolvedType::new(name, category);
        resolved.size_bytes = base.size.unwrap_or(0);
        resolved.is_signed = base.signed.unwrap_or(false);
        resolved.is_little_endian = tags::is_little_endian(base.endian.as_deref());
        resolved
    }

    fn resolve_named(&self, name: String, category: TypeCategory) -> ResolvedType {
        let mut resolved = ResolvedType::new(name, category);
        match category {
            TypeCategory::Enum => {
                if let Some(raw) = self.enums.get(&resolved.name) {
                    resolved.size_bytes = raw.size.unwrap_or(0);
                    if let Some(base) = raw.base.as_deref().and_then(|b| self.base_types.get(b)) {
                        resolved.is_signed = base.signed.unwrap_or(false);
                        resolved.is_little_endian = tags::is_little_endian(base.endian.as_deref());
                    }
                }
            }
            TypeCategory::Struct | TypeCategory::Union => {
                resolved.size_bytes = self
                    .user_sizes
                    .get(&resolved.name)
                    .copied()
                    .or_else(|| {
                        self.registry
                            .lookup_type(&resolved.name)
                            .map(|st| st.size_bytes)
                    })
                    .unwrap_or(0);
            }
            _ => {}
        }
        resolved
    }

    fn resolve_pointer(&self, ty: &RawType) -> ResolvedType {
        let pointee = match ty.subtype.as_deref() {
            Some(subtype) => self.resolve(subtype),
            None => ResolvedType::new("void", TypeCategory::Void),
        };

        let mut resolved = ResolvedType::new(format!("{}*", pointee.name), pointee.category);
        resolved.size_bytes = self.pointer.size_bytes;
        resolved.is_little_endian = self.pointer.is_little_endian;
        resolved.indirection = pointee.indirection + 1;
        resolved.target_name = if pointee.indirection == 0 {
            pointee.name
        } else {
            pointee.target_name
        };

        if resolved.indirection > 2 {
            resolved.invalid_reason = Some(format!(
                "{} levels of indirection are not supported",
                resolved.indirection
            ));
        }
        resolved
    }

    fn resolve_array(&self, ty: &RawType) -> ResolvedType {
        let element = match ty.subtype.as_deref() {
            Some(subtype) => self.resolve(subtype),
            None => return ResolvedType::invalid("array", "array without element type"),
        };

        let mut resolved = ResolvedType::new(format!("{}[]", element.name), TypeCategory::Array);
        resolved.size_bytes = ty
            .size
            .unwrap_or_else(|| ty.count.unwrap_or(0).saturating_mul(element.size_bytes));
        resolved.is_little_endian = element.is_little_endian;
        resolved.is_signed = element.is_signed;
        if ty.count.is_none() && ty.size.is_none() {
            resolved.invalid_reason = Some("array without count".to_string());
        } else if let Some(reason) = &element.invalid_reason {
            resolved.invalid_reason = Some(format!("array element: {}", reason));
        } else if element.size_bytes == 0 && resolved.size_bytes > 0 {
            resolved.invalid_reason =
                Some(format!("array element '{}' has unknown size", element.name));
        }
        resolved.element = Some(Box::new(element));
        resolved
    }

    fn resolve_bitfield(&self, ty: &RawType) -> ResolvedType {
        let mut resolved = match ty.inner.as_deref() {
            Some(inner) => self.resolve(inner),
            None => return ResolvedType::invalid("bitfield", "bitfield without storage type"),
        };

        match (ty.bit_position, ty.bit_length) {
            (Some(bit_position), Some(bit_length)) => {
                resolved.bitfield = Some(Bitfield {
                    bit_position,
                    bit_length,
                });
            }
            _ => {
                resolved.invalid_reason = Some("bitfield without position/length".to_string());
            }
        }
        resolved
    }
}
