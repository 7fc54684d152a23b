//! Core module containing the type descriptor model for dwarf-query
//!
//! This module provides the foundational building blocks used throughout
//! the crate: guest addresses, type categories, member and structured type
//! descriptors, decoded values and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, MemberDescriptor, PrimitiveValue, QueryError, QueryResult, StructuredType,
    TypeCategory,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
