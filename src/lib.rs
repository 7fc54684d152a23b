//! dwarf-query: DWARF-derived type metadata and typed guest memory reads

pub mod config;
pub mod core;
pub mod loader;
pub mod memory;
pub mod registry;
pub mod session;

// Re-export main types from core module
pub use crate::core::types::{
    Address, Bitfield, ExtendedFloat, MemberDescriptor, PrimitiveValue, QueryError, QueryResult,
    StructuredType, TypeCategory, ValueKind, NONE_SENTINEL, UNKNOWN_SENTINEL,
};

pub use loader::{LoadReport, LoaderOptions, MetadataLoader};
pub use memory::{
    read_member, GuestArchitecture, MemoryFault, MemoryProvider, SnapshotMemory, TypedReader,
};
pub use registry::{SharedRegistry, TypeRegistry};
pub use session::{AnalysisSession, PointerTarget};

// Re-export core directly for full access
pub use crate::core::{AUTHORS, VERSION};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_module_accessible() {
        let _version = crate::core::VERSION;
        let _authors = crate::core::AUTHORS;
        assert_eq!(crate::core::VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_address_reexport() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.as_u64(), 0x1000);
        assert!(Address::null().is_null());
    }

    #[test]
    fn test_descriptor_reexports() {
        let member = MemberDescriptor::new("flags")
            .with_layout(4, 2)
            .with_category(TypeCategory::Int);
        assert_eq!(member.element_count(), -1);

        let st = StructuredType::new("task_struct").with_member(member);
        assert!(st.member("flags").is_some());
        assert_eq!(StructuredType::default().name, UNKNOWN_SENTINEL);
    }

    #[test]
    fn test_value_reexport() {
        let value = PrimitiveValue::UInt(42);
        assert_eq!(value.kind(), ValueKind::UInt);
        assert_eq!(value.as_i128(), Some(42));
    }

    #[test]
    fn test_error_reexport() {
        let error = QueryError::unsupported("aggregate member");
        assert!(error.to_string().contains("aggregate member"));

        let result: QueryResult<u32> = Err(QueryError::TypeNotFound("inode".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_loading_through_reexports() {
        let mut registry = TypeRegistry::new();
        let report = MetadataLoader::default()
            .load_str(
                &mut registry,
                r#"{"user_types": {"foo": {"size": 4, "fields": {}}}}"#,
            )
            .unwrap();
        assert!(report.is_clean());

        let session = AnalysisSession::new(registry);
        assert_eq!(session.registry().type_count(), 1);
        assert_eq!(GuestArchitecture::default().pointer_size(), 8);
    }
}
