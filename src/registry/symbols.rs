//! Address-ordered function table used for symbolication

use crate::core::types::Address;
use std::collections::BTreeMap;

/// Function start addresses mapped to names, kept in address order
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: BTreeMap<Address, String>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a function; an existing entry at the same address is replaced
    pub fn insert(&mut self, address: Address, name: impl Into<String>) -> Option<String> {
        self.entries.insert(address, name.into())
    }

    /// Exact-address lookup
    pub fn get(&self, address: Address) -> Option<&str> {
        self.entries.get(&address).map(String::as_str)
    }

    /// Nearest function starting at or below `address`
    pub fn containing(&self, address: Address) -> Option<(Address, &str)> {
        self.entries
            .range(..=address)
            .next_back()
            .map(|(start, name)| (*start, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending address order
    pub fn iter(&self) -> impl Iterator<Item = (Address, &str)> {
        self.entries.iter().map(|(a, n)| (*a, n.as_str()))
    }
}
