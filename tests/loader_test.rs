use dwarf_query::loader::{LoaderOptions, MetadataLoader};
use dwarf_query::{Address, QueryError, TypeCategory, TypeRegistry, NONE_SENTINEL};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn load(doc: serde_json::Value) -> (TypeRegistry, dwarf_query::LoadReport) {
    let mut registry = TypeRegistry::new();
    let report = dwarf_query::loader::load(&mut registry, &doc).unwrap();
    (registry, report)
}

#[test]
fn test_single_int_member_round_trip() {
    let (registry, report) = load(json!({
        "user_types": {
            "foo": {
                "kind": "struct",
                "size": 4,
                "fields": {
                    "x": {"offset": 0, "type": {"kind": "int", "size": 4, "signed": true, "endian": "little"}}
                }
            }
        }
    }));
    assert!(report.is_clean());

    let foo = registry.lookup_type("foo").unwrap();
    assert_eq!(foo.size_bytes, 4);
    assert_eq!(foo.members.len(), 1);

    let x = &foo.members[0];
    assert_eq!(x.name, "x");
    assert_eq!(x.category, TypeCategory::Int);
    assert_eq!(x.size_bytes, 4);
    assert_eq!(x.offset_bytes, 0);
    assert!(x.is_little_endian);
    assert!(x.is_signed);
    assert!(x.is_valid);
    assert!(!x.is_pointer);
    assert_eq!(x.pointer_target_name, NONE_SENTINEL);
}

#[test]
fn test_malformed_entry_is_skipped() {
    let (registry, report) = load(json!({
        "user_types": {
            "good_a": {"size": 4, "fields": {}},
            "broken": {"kind": "struct", "fields": {}},
            "good_b": {"size": 8, "fields": {}}
        }
    }));

    assert_eq!(registry.type_count(), 2);
    assert_eq!(report.structs_loaded, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].record, "broken");
    assert!(matches!(
        report.skipped[0].error,
        QueryError::MalformedMetadata { .. }
    ));
    assert!(registry.lookup_type("broken").is_none());
}

#[test]
fn test_listed_document_keeps_declaration_order() {
    let (registry, _) = load(json!({
        "base_types": {
            "unsigned short": {"kind": "int", "size": 2, "signed": false, "endian": "big"}
        },
        "user_types": [
            {"name": "hdr", "kind": "struct", "size": 4, "fields": [
                {"name": "len", "offset": 2, "type": {"kind": "base", "name": "unsigned short"}},
                {"name": "tag", "offset": 0, "type": {"kind": "base", "name": "unsigned short"}}
            ]},
            {"kind": "struct", "size": 4, "fields": []}
        ]
    }));

    let hdr = registry.lookup_type("hdr").unwrap();
    let names: Vec<&str> = hdr.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["len", "tag"]);
    assert!(!hdr.members[0].is_little_endian);
    assert_eq!(registry.type_count(), 1);
}

#[test]
fn test_keyed_fields_are_ordered_by_offset() {
    let (registry, _) = load(json!({
        "user_types": {
            "pair": {"size": 8, "fields": {
                "a_second": {"offset": 4, "type": {"kind": "int", "size": 4}},
                "z_first": {"offset": 0, "type": {"kind": "int", "size": 4}}
            }}
        }
    }));
    let pair = registry.lookup_type("pair").unwrap();
    assert_eq!(pair.members[0].name, "z_first");
    assert_eq!(pair.members[1].name, "a_second");
}

#[test]
fn test_flat_member_with_tag_string() {
    let (registry, _) = load(json!({
        "user_types": [
            {"name": "flat", "size": 4, "fields": [
                {"name": "count", "offset": 0, "size": 4, "type": "int", "signed": true, "endian": "little"}
            ]}
        ]
    }));
    let count = &registry.lookup_type("flat").unwrap().members[0];
    assert_eq!(count.category, TypeCategory::Int);
    assert_eq!(count.size_bytes, 4);
    assert!(count.is_signed);
    assert!(count.is_valid);
}

#[test]
fn test_unknown_tag_only_invalidates_member() {
    let (registry, report) = load(json!({
        "user_types": {
            "s": {"size": 8, "fields": {
                "odd": {"offset": 0, "type": {"kind": "vector", "size": 4}},
                "ok": {"offset": 4, "type": {"kind": "int", "size": 4}}
            }}
        }
    }));
    let s = registry.lookup_type("s").unwrap();
    assert!(!s.member("odd").unwrap().is_valid);
    assert!(s.member("ok").unwrap().is_valid);
    assert_eq!(report.invalid_members, 1);
    assert!(report.is_clean());
}

#[test]
fn test_array_of_unknown_base_keeps_struct() {
    let (registry, report) = load(json!({
        "base_types": {"int": {"kind": "int", "size": 4, "signed": true, "endian": "little"}},
        "user_types": {
            "s": {"kind": "struct", "size": 40, "fields": {
                "id": {"offset": 0, "type": {"kind": "base", "name": "int"}},
                "blob": {"offset": 8, "type": {"kind": "array", "size": 32,
                    "subtype": {"kind": "base", "name": "__int128"}}}
            }}
        }
    }));
    assert_eq!(report.structs_loaded, 1);
    assert!(report.is_clean());
    assert_eq!(report.invalid_members, 1);

    let s = registry.lookup_type("s").unwrap();
    assert!(s.member("id").unwrap().is_valid);
    let blob = s.member("blob").unwrap();
    assert!(!blob.is_valid);
    assert_eq!(blob.category, TypeCategory::Array);
    assert_eq!(blob.size_bytes, 32);
}

#[test]
fn test_pointer_array_enum_and_bitfield_members() {
    let (registry, report) = load(json!({
        "base_types": {
            "char": {"kind": "char", "size": 1, "signed": true, "endian": "little"},
            "unsigned int": {"kind": "int", "size": 4, "signed": false, "endian": "little"},
            "pointer": {"kind": "int", "size": 4, "signed": false, "endian": "little"}
        },
        "enums": {
            "state": {"size": 4, "base": "unsigned int"}
        },
        "user_types": {
            "task": {"kind": "struct", "size": 32, "fields": {
                "comm": {"offset": 0, "type": {"kind": "array", "count": 16,
                    "subtype": {"kind": "base", "name": "char"}}},
                "parent": {"offset": 16, "type": {"kind": "pointer",
                    "subtype": {"kind": "struct", "name": "task"}}},
                "argv": {"offset": 20, "type": {"kind": "pointer",
                    "subtype": {"kind": "pointer", "subtype": {"kind": "base", "name": "char"}}}},
                "st": {"offset": 24, "type": {"kind": "enum", "name": "state"}},
                "flags": {"offset": 28, "type": {"kind": "bitfield", "bit_position": 3, "bit_length": 2,
                    "type": {"kind": "base", "name": "unsigned int"}}}
            }}
        }
    }));
    assert!(report.is_clean());
    let task = registry.lookup_type("task").unwrap();

    let comm = task.member("comm").unwrap();
    assert_eq!(comm.category, TypeCategory::Array);
    assert_eq!(comm.size_bytes, 16);
    assert_eq!(comm.array_element_name, "char");
    assert_eq!(comm.array_element_category, TypeCategory::Char);
    assert_eq!(comm.element_count(), 16);

    let parent = task.member("parent").unwrap();
    assert!(parent.is_pointer);
    assert!(!parent.is_double_pointer);
    assert_eq!(parent.size_bytes, 4);
    assert_eq!(parent.pointer_target_name, "task");

    let argv = task.member("argv").unwrap();
    assert!(argv.is_double_pointer);
    assert_eq!(argv.pointer_target_name, "char");

    let st = task.member("st").unwrap();
    assert_eq!(st.category, TypeCategory::Enum);
    assert_eq!(st.size_bytes, 4);
    assert!(!st.is_signed);

    let flags = task.member("flags").unwrap();
    assert_eq!(flags.category, TypeCategory::Int);
    assert_eq!(flags.bitfield.map(|b| (b.bit_position, b.bit_length)), Some((3, 2)));
}

#[test]
fn test_triple_pointer_is_invalid() {
    let (registry, _) = load(json!({
        "user_types": {"s": {"size": 8, "fields": {
            "ppp": {"offset": 0, "type": {"kind": "pointer", "subtype": {"kind": "pointer",
                "subtype": {"kind": "pointer", "subtype": {"kind": "void"}}}}}
        }}}
    }));
    assert!(!registry.lookup_type("s").unwrap().members[0].is_valid);
}

#[test]
fn test_later_load_replaces_same_name() {
    let loader = MetadataLoader::default();
    let mut registry = TypeRegistry::new();
    loader
        .load_str(&mut registry, r#"{"user_types": {"foo": {"size": 4, "fields": {}}}}"#)
        .unwrap();
    loader
        .load_str(
            &mut registry,
            r#"{"user_types": {"foo": {"size": 8, "fields": {}}, "bar": {"size": 1, "fields": {}}}}"#,
        )
        .unwrap();

    assert_eq!(registry.type_count(), 2);
    assert_eq!(registry.lookup_type("foo").unwrap().size_bytes, 8);
}

#[test]
fn test_function_symbols_populate_table() {
    let (registry, report) = load(json!({
        "symbols": {
            "main": {"address": 0x1000, "type": {"kind": "function"}},
            "start": {"address": 0x800},
            "init_task": {"address": 0x9000, "type": {"kind": "struct", "name": "task"}}
        }
    }));
    assert_eq!(report.functions_loaded, 2);
    assert_eq!(registry.function_count(), 2);
    assert_eq!(registry.lookup_function(Address::new(0x800)), Some("start"));
    assert_eq!(
        registry.lookup_function_containing(Address::new(0x9004)),
        Some("main")
    );
}

#[test]
fn test_invalid_documents() {
    let loader = MetadataLoader::default();
    let mut registry = TypeRegistry::new();
    assert!(matches!(
        loader.load_str(&mut registry, "not json"),
        Err(QueryError::JsonError(_))
    ));
    assert!(matches!(
        loader.load_str(&mut registry, "[]"),
        Err(QueryError::MalformedMetadata { .. })
    ));
}

#[test]
fn test_load_file_with_options() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"user_types": {{"a": {{"size": 4, "fields": {{}}}}, "b": {{"size": 4, "fields": {{}}}}}}}}"#
    )
    .unwrap();

    let loader = MetadataLoader::new(LoaderOptions {
        max_threads: 2,
        parallel_threshold: 1,
        verbose: true,
        ..LoaderOptions::default()
    });
    let mut registry = TypeRegistry::new();
    let report = loader.load_file(&mut registry, file.path()).unwrap();
    assert_eq!(report.structs_loaded, 2);
    assert_eq!(registry.type_names(), vec!["a", "b"]);
}

#[test]
fn test_missing_file_is_io_error() {
    let mut registry = TypeRegistry::new();
    let err = MetadataLoader::default()
        .load_file(&mut registry, "/nonexistent/types.json")
        .unwrap_err();
    assert!(matches!(err, QueryError::IoError(_)));
}
