//! Core type definitions for dwarf-query
//!
//! This module contains the type descriptor model (categories, member
//! descriptors, structured types), guest addresses, decoded values and
//! error types.

mod address;
mod category;
mod error;
mod member;
mod structured;
mod value;

// Re-export all public types
pub use address::Address;
pub use category::TypeCategory;
pub use error::{QueryError, QueryResult};
pub use member::{Bitfield, MemberDescriptor, NONE_SENTINEL, UNKNOWN_SENTINEL};
pub use structured::StructuredType;
pub use value::{ExtendedFloat, PrimitiveValue, ValueKind};
