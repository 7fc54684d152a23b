//! Named aggregate (struct or union) with its ordered members

use super::member::{MemberDescriptor, UNKNOWN_SENTINEL};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A struct or union definition: name, total size and members in layout order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredType {
    pub name: String,
    pub size_bytes: u64,
    pub members: Vec<MemberDescriptor>,
}

impl StructuredType {
    /// Creates an empty structured type
    pub fn new(name: impl Into<String>) -> Self {
        StructuredType {
            name: name.into(),
            size_bytes: 0,
            members: Vec::new(),
        }
    }

    /// Sets the total size
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Appends a member
    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Finds a member by name
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Number of members flagged as not decodable
    pub fn invalid_member_count(&self) -> usize {
        self.members.iter().filter(|m| !m.is_valid).count()
    }
}

impl Default for StructuredType {
    fn default() -> Self {
        Self::new(UNKNOWN_SENTINEL)
    }
}

impl fmt::Display for StructuredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "struct '{}' (size: {}, members: {}):",
            self.name,
            self.size_bytes,
            self.members.len()
        )?;
        for member in &self.members {
            writeln!(f, "\t{}", member)?;
        }
        Ok(())
    }
}
