//! Analysis session: the owned registry plus typed access helpers

use crate::config::Config;
use crate::core::types::{
    Address, MemberDescriptor, PrimitiveValue, QueryError, QueryResult, StructuredType,
};
use crate::loader::{LoadReport, MetadataLoader};
use crate::memory::{MemoryProvider, TypedReader};
use crate::registry::{SharedRegistry, TypeRegistry};
use std::sync::Arc;
use tracing::{debug, info};

/// Destination of one explicit pointer chase
#[derive(Debug, Clone, Copy)]
pub struct PointerTarget<'r> {
    /// Value read from the pointer slot
    pub address: Address,
    /// Registered layout of the pointee, when it is a known structure
    pub layout: Option<&'r StructuredType>,
}

/// One analysis session over a loaded, read-only registry.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    registry: SharedRegistry,
}

impl AnalysisSession {
    /// Wraps an already populated registry
    pub fn new(registry: TypeRegistry) -> Self {
        AnalysisSession {
            registry: registry.into_shared(),
        }
    }

    /// Shares a registry that is already behind an `Arc`
    pub fn with_shared(registry: SharedRegistry) -> Self {
        AnalysisSession { registry }
    }

    /// Loads the metadata file named by `config` into a fresh registry
    pub fn from_config(config: &Config) -> QueryResult<(Self, LoadReport)> {
        let loader = MetadataLoader::new(config.loader_options());
        let mut registry = TypeRegistry::new();
        let report = loader.load_file(&mut registry, &config.metadata.path)?;
        info!(
            structs = registry.type_count(),
            functions = registry.function_count(),
            skipped = report.skipped.len(),
            "analysis session ready"
        );
        Ok((Self::new(registry), report))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Another handle to the shared registry
    pub fn shared_registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Looks up a structure, failing with `TypeNotFound`
    pub fn structure(&self, name: &str) -> QueryResult<&StructuredType> {
        self.registry
            .lookup_type(name)
            .ok_or_else(|| QueryError::TypeNotFound(name.to_string()))
    }

    /// Looks up one member of a structure
    pub fn member(&self, type_name: &str, member: &str) -> QueryResult<&MemberDescriptor> {
        self.structure(type_name)?
            .member(member)
            .ok_or_else(|| QueryError::member_not_found(type_name, member))
    }

    /// Reads `type_name.member` of the instance located at `base`
    pub fn read_field<P: MemoryProvider + ?Sized>(
        &self,
        provider: &P,
        base: Address,
        type_name: &str,
        member: &str,
    ) -> QueryResult<PrimitiveValue> {
        let rdt = self.member(type_name, member)?;
        TypedReader::new(provider).read_field(base, rdt)
    }

    /// Reads every member of the `type_name` instance at `base`.
    ///
    /// Each member carries its own result so one unreadable leaf does not
    /// hide the others.
    pub fn read_struct<P: MemoryProvider + ?Sized>(
        &self,
        provider: &P,
        base: Address,
        type_name: &str,
    ) -> QueryResult<Vec<(&str, QueryResult<PrimitiveValue>)>> {
        let st = self.structure(type_name)?;
        Ok(TypedReader::new(provider).read_members(base, st))
    }

    /// Reads the pointer member stored at `address` and resolves its target.
    ///
    /// Exactly one level is followed. For a double pointer the result is the
    /// address of the inner pointer slot, which the caller chases again.
    pub fn follow_pointer<P: MemoryProvider + ?Sized>(
        &self,
        provider: &P,
        address: Address,
        rdt: &MemberDescriptor,
    ) -> QueryResult<PointerTarget<'_>> {
        if !rdt.is_indirect() {
            return Err(QueryError::unsupported(format!(
                "{} is not a pointer",
                rdt.name
            )));
        }

        let value = TypedReader::new(provider).read_member(address, rdt)?;
        let target = value.as_address().ok_or_else(|| {
            QueryError::unsupported(format!("{} did not decode to a pointer", rdt.name))
        })?;

        let layout = if rdt.is_double_pointer {
            None
        } else {
            self.registry.lookup_type(&rdt.pointer_target_name)
        };
        debug!(member = %rdt.name, from = %address, to = %target, "followed pointer");
        Ok(PointerTarget {
            address: target,
            layout,
        })
    }

    /// Name of the function containing `address`, if any
    pub fn symbolicate(&self, address: Address) -> Option<&str> {
        self.registry.lookup_function_containing(address)
    }
}
