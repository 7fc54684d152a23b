//! Error types for dwarf-query

use super::address::Address;
use thiserror::Error;

/// Main error type for metadata loading and typed reads
#[derive(Error, Debug)]
pub enum QueryError {
    /// A single record of the metadata document is structurally invalid
    #[error("Malformed metadata record '{record}': {reason}")]
    MalformedMetadata { record: String, reason: String },

    /// The descriptor cannot be decoded into a primitive value
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The memory provider could not supply the requested bytes
    #[error("Failed to read {width} bytes at {address}: {reason}")]
    MemoryAccess {
        address: Address,
        width: usize,
        reason: String,
    },

    /// A descriptor violates a layout invariant (corrupt type definition)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Type not found: {0}")]
    TypeNotFound(String),

    #[error("Member '{member}' not found in '{type_name}'")]
    MemberNotFound { type_name: String, member: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid hex data: {0}")]
    HexError(#[from] hex::FromHexError),
}

/// Result type alias for dwarf-query operations
pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Creates a malformed metadata error scoped to one record
    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::MalformedMetadata {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported type error
    pub fn unsupported(reason: impl Into<String>) -> Self {
        QueryError::UnsupportedType(reason.into())
    }

    /// Creates a memory access error
    pub fn memory_access(address: Address, width: usize, reason: impl Into<String>) -> Self {
        QueryError::MemoryAccess {
            address,
            width,
            reason: reason.into(),
        }
    }

    /// Creates an invariant violation error
    pub fn invariant(reason: impl Into<String>) -> Self {
        QueryError::InvariantViolation(reason.into())
    }

    /// Creates a member not found error
    pub fn member_not_found(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        QueryError::MemberNotFound {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// True for failures scoped to a single read that a caller may skip
    pub fn is_per_read(&self) -> bool {
        matches!(
            self,
            QueryError::UnsupportedType(_) | QueryError::MemoryAccess { .. }
        )
    }
}
