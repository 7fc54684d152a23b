//! Storage layout description of one member of a structured type

use super::category::TypeCategory;
use super::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for "no pointer target" / "no array element"
pub const NONE_SENTINEL: &str = "{none}";

/// Placeholder name for descriptors built without a name
pub const UNKNOWN_SENTINEL: &str = "{unknown}";

/// Sub-byte placement of a bitfield inside its storage unit.
///
/// `bit_position` counts from the least significant bit of the storage unit
/// after it has been reassembled in target byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitfield {
    pub bit_position: u32,
    pub bit_length: u32,
}

/// Layout of one field: where it lives, how wide it is and how to decode it.
///
/// `is_pointer` and `is_double_pointer` describe zero, one or two levels of
/// indirection. When either is set, `category` describes the pointee and the
/// stored value is an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub offset_bytes: u64,
    pub category: TypeCategory,
    pub is_pointer: bool,
    pub is_double_pointer: bool,
    pub is_little_endian: bool,
    pub is_signed: bool,
    pub is_valid: bool,

    pub pointer_target_name: String,

    pub array_element_name: String,
    pub array_element_category: TypeCategory,
    pub array_element_size_bytes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitfield: Option<Bitfield>,
}

impl MemberDescriptor {
    /// Creates a direct (non-pointer) descriptor with the given name
    pub fn new(name: impl Into<String>) -> Self {
        MemberDescriptor {
            name: name.into(),
            size_bytes: 0,
            offset_bytes: 0,
            category: TypeCategory::Void,
            is_pointer: false,
            is_double_pointer: false,
            is_little_endian: true,
            is_signed: false,
            is_valid: true,
            pointer_target_name: NONE_SENTINEL.to_string(),
            array_element_name: NONE_SENTINEL.to_string(),
            array_element_category: TypeCategory::Void,
            array_element_size_bytes: 0,
            bitfield: None,
        }
    }

    /// Creates a single-pointer descriptor whose pointee is `target`.
    ///
    /// Set `is_double_pointer` instead for a pointer to a pointer.
    pub fn pointer(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut rdt = Self::new(name);
        rdt.is_pointer = true;
        rdt.pointer_target_name = target.into();
        rdt
    }

    /// Creates an array descriptor, checking the element-size invariant
    pub fn array(
        name: impl Into<String>,
        size_bytes: u64,
        element_name: impl Into<String>,
        element_category: TypeCategory,
        element_size_bytes: u64,
    ) -> QueryResult<Self> {
        let mut rdt = Self::new(name);
        rdt.category = TypeCategory::Array;
        rdt.size_bytes = size_bytes;
        rdt.array_element_name = element_name.into();
        rdt.array_element_category = element_category;
        rdt.array_element_size_bytes = element_size_bytes;
        rdt.check_invariants()?;
        Ok(rdt)
    }

    /// Sets offset and size
    pub fn with_layout(mut self, offset_bytes: u64, size_bytes: u64) -> Self {
        self.offset_bytes = offset_bytes;
        self.size_bytes = size_bytes;
        self
    }

    /// Sets the category
    pub fn with_category(mut self, category: TypeCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets byte order and signedness
    pub fn with_encoding(mut self, is_little_endian: bool, is_signed: bool) -> Self {
        self.is_little_endian = is_little_endian;
        self.is_signed = is_signed;
        self
    }

    /// Marks the descriptor as not decodable
    pub fn invalidated(mut self) -> Self {
        self.is_valid = false;
        self
    }

    /// Levels of indirection: 0, 1 or 2
    pub fn indirection(&self) -> u8 {
        if self.is_double_pointer {
            2
        } else if self.is_pointer {
            1
        } else {
            0
        }
    }

    /// Whether the stored value is an address rather than the value itself
    pub fn is_indirect(&self) -> bool {
        self.is_pointer || self.is_double_pointer
    }

    /// Verifies layout invariants of the descriptor
    pub fn check_invariants(&self) -> QueryResult<()> {
        if self.category == TypeCategory::Array && self.size_bytes > 0 {
            if self.array_element_size_bytes == 0 {
                return Err(QueryError::invariant(format!(
                    "array '{}' has size {} but zero-sized elements",
                    self.name, self.size_bytes
                )));
            }
            if self.size_bytes % self.array_element_size_bytes != 0 {
                return Err(QueryError::invariant(format!(
                    "array '{}' size {} is not a multiple of element size {}",
                    self.name, self.size_bytes, self.array_element_size_bytes
                )));
            }
        }
        Ok(())
    }

    /// Element count, or -1 when the member is not an array
    pub fn try_element_count(&self) -> QueryResult<i64> {
        if self.category != TypeCategory::Array {
            return Ok(-1);
        }
        if self.size_bytes == 0 {
            return Ok(0);
        }
        self.check_invariants()?;
        i64::try_from(self.size_bytes / self.array_element_size_bytes).map_err(|_| {
            QueryError::invariant(format!(
                "array '{}' element count {} does not fit in i64",
                self.name,
                self.size_bytes / self.array_element_size_bytes
            ))
        })
    }

    /// Element count, or -1 when the member is not an array.
    ///
    /// # Panics
    ///
    /// Panics if the array size is not a multiple of the element size. Such a
    /// descriptor comes from corrupt metadata and would mis-decode memory.
    pub fn element_count(&self) -> i64 {
        match self.try_element_count() {
            Ok(count) => count,
            Err(err) => panic!("{}", err),
        }
    }
}

impl Default for MemberDescriptor {
    fn default() -> Self {
        Self::new(UNKNOWN_SENTINEL)
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "member '{}' (offset: {}, type: {}, size: {}, ptr: {}, dptr: {}, le: {}, signed: {}, valid: {})",
            self.name,
            self.offset_bytes,
            self.category,
            self.size_bytes,
            self.is_pointer,
            self.is_double_pointer,
            self.is_little_endian,
            self.is_signed,
            self.is_valid
        )
    }
}
