//! Type registry: structured types by name and functions by address
//!
//! A registry is populated by the metadata loader during a single
//! initialization phase and is read-only afterwards. Sessions share it
//! through [`SharedRegistry`], so concurrent readers never observe a
//! mutation.

mod symbols;

pub use symbols::FunctionTable;

use crate::core::types::{Address, StructuredType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry frozen after loading, safe to share across analysis threads
pub type SharedRegistry = Arc<TypeRegistry>;

/// Lookup state for one analysis session
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    structs: HashMap<String, StructuredType>,
    functions: FunctionTable,
}

impl TypeRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a structured type; a previous entry with the same name is replaced
    pub fn register_type(&mut self, st: StructuredType) {
        if self.structs.contains_key(&st.name) {
            debug!(name = %st.name, "replacing previously registered type");
        }
        self.structs.insert(st.name.clone(), st);
    }

    /// Looks up a structured type by name
    pub fn lookup_type(&self, name: &str) -> Option<&StructuredType> {
        self.structs.get(name)
    }

    /// Registers a function start address; duplicates overwrite
    pub fn register_function(&mut self, address: Address, name: impl Into<String>) {
        self.functions.insert(address, name);
    }

    /// Exact-address function lookup
    pub fn lookup_function(&self, address: Address) -> Option<&str> {
        self.functions.get(address)
    }

    /// Name of the nearest function starting at or below `address`
    pub fn lookup_function_containing(&self, address: Address) -> Option<&str> {
        self.functions.containing(address).map(|(_, name)| name)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.structs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn type_count(&self) -> usize {
        self.structs.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Ends the mutable phase and shares the registry read-only
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(self)
    }
}
