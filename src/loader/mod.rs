//! Metadata loader: populates a [`TypeRegistry`] from a JSON type dump
//!
//! The document is the output of an external DWARF extraction tool. It is
//! untrusted: one malformed struct entry is reported in the [`LoadReport`]
//! and skipped, a member with an unrecognized type description is loaded
//! with `is_valid = false`, and everything else still lands in the registry.
//!
//! Accepted top-level keys (all optional):
//!
//! - `base_types`: name -> `{kind, size, signed, endian}`; `"pointer"` gives
//!   the target pointer width and byte order
//! - `user_types`: object keyed by type name, or array of objects with `name`
//! - `enums`: name -> `{size, base}`
//! - `symbols`: name -> `{address, type}`; function symbols feed symbolication

mod document;
mod resolve;
pub mod tags;

pub use resolve::PointerLayout;

use crate::core::types::{
    Address, MemberDescriptor, QueryError, QueryResult, StructuredType, UNKNOWN_SENTINEL,
};
use crate::registry::TypeRegistry;
use document::{RawBaseType, RawEnum, RawField, RawFields, RawStruct, RawSymbol, RawType};
use rayon::prelude::*;
use resolve::Resolver;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, trace, warn};

/// Tunables for [`MetadataLoader`]
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Worker threads used to parse struct entries
    pub max_threads: usize,
    /// Entry count from which parsing runs on the thread pool
    pub parallel_threshold: usize,
    /// Log every resolved member at info level
    pub verbose: bool,
    /// Used when the document has no `pointer` base type
    pub default_pointer: PointerLayout,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            max_threads: num_cpus::get().min(8),
            parallel_threshold: 256,
            verbose: false,
            default_pointer: PointerLayout {
                size_bytes: 8,
                is_little_endian: true,
            },
        }
    }
}

/// A record that could not be loaded
#[derive(Debug)]
pub struct SkippedRecord {
    pub record: String,
    pub error: QueryError,
}

/// Outcome of one `load` call
#[derive(Debug, Default)]
pub struct LoadReport {
    pub structs_loaded: usize,
    pub functions_loaded: usize,
    pub invalid_members: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl LoadReport {
    /// True when no record was skipped
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, record: impl Into<String>, error: QueryError) {
        let record = record.into();
        match &error {
            QueryError::InvariantViolation(_) => {
                error!(record = %record, error = %error, "corrupt type definition skipped")
            }
            _ => warn!(record = %record, error = %error, "malformed metadata record skipped"),
        }
        self.skipped.push(SkippedRecord { record, error });
    }
}

/// Parses metadata documents into a registry
#[derive(Debug, Clone, Default)]
pub struct MetadataLoader {
    options: LoaderOptions,
}

impl MetadataLoader {
    /// Creates a loader with the given options
    pub fn new(options: LoaderOptions) -> Self {
        MetadataLoader { options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Loads a JSON file
    pub fn load_file<P: AsRef<Path>>(
        &self,
        registry: &mut TypeRegistry,
        path: P,
    ) -> QueryResult<LoadReport> {
        let contents = fs::read_to_string(path.as_ref())?;
        info!(path = %path.as_ref().display(), bytes = contents.len(), "loading type metadata");
        self.load_str(registry, &contents)
    }

    /// Loads a JSON document given as text
    pub fn load_str(&self, registry: &mut TypeRegistry, json: &str) -> QueryResult<LoadReport> {
        let root: Value = serde_json::from_str(json)?;
        self.load(registry, &root)
    }

    /// Loads a parsed JSON document into `registry`.
    ///
    /// Fails only when the document itself is not a JSON object; record-level
    /// problems are collected in the returned report.
    pub fn load(&self, registry: &mut TypeRegistry, root: &Value) -> QueryResult<LoadReport> {
        let root = root
            .as_object()
            .ok_or_else(|| QueryError::malformed("document", "top level is not an object"))?;

        let mut report = LoadReport::default();

        let base_types: HashMap<String, RawBaseType> =
            parse_table(root, "base_types", &mut report);
        let enums: HashMap<String, RawEnum> = parse_table(root, "enums", &mut report);
        let entries = collect_struct_entries(root, &mut report);

        let user_sizes: HashMap<String, u64> = entries
            .iter()
            .filter_map(|(name, value)| {
                let size = value.get("size")?.as_u64()?;
                Some((name.clone(), size))
            })
            .collect();

        let pointer = base_types
            .get("pointer")
            .map(|p| PointerLayout {
                size_bytes: p.size.unwrap_or(self.options.default_pointer.size_bytes),
                is_little_endian: tags::is_little_endian(p.endian.as_deref()),
            })
            .unwrap_or(self.options.default_pointer);

        let resolver = Resolver {
            base_types: &base_types,
            enums: &enums,
            user_sizes: &user_sizes,
            registry: &*registry,
            pointer,
        };

        let parsed = self.parse_entries(&resolver, &entries);

        for ((name, _), result) in entries.iter().zip(parsed) {
            match result {
                Ok(st) => {
                    report.invalid_members += st.invalid_member_count();
                    debug!(name = %st.name, size = st.size_bytes, members = st.members.len(), "registered type");
                    registry.register_type(st);
                    report.structs_loaded += 1;
                }
                Err(err) => report.skip(name.clone(), err),
            }
        }

        self.load_symbols(registry, root, &mut report);

        info!(
            structs = report.structs_loaded,
            functions = report.functions_loaded,
            invalid_members = report.invalid_members,
            skipped = report.skipped.len(),
            "type metadata loaded"
        );
        Ok(report)
    }

    fn parse_entries(
        &self,
        resolver: &Resolver<'_>,
        entries: &[(String, &Value)],
    ) -> Vec<QueryResult<StructuredType>> {
        let parse = |(name, value): &(String, &Value)| self.parse_struct(resolver, name, value);

        if entries.len() >= self.options.parallel_threshold && self.options.max_threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.max_threads)
                .build()
            {
                Ok(pool) => return pool.install(|| entries.par_iter().map(parse).collect()),
                Err(err) => warn!(error = %err, "thread pool unavailable, parsing sequentially"),
            }
        }
        entries.iter().map(parse).collect()
    }

    fn parse_struct(
        &self,
        resolver: &Resolver<'_>,
        name: &str,
        value: &Value,
    ) -> QueryResult<StructuredType> {
        let raw: RawStruct = serde_json::from_value(value.clone())
            .map_err(|e| QueryError::malformed(name, e.to_string()))?;

        match raw.kind.as_deref() {
            None | Some("struct") | Some("union") | Some("class") => {}
            Some(other) => {
                return Err(QueryError::malformed(
                    name,
                    format!("user type kind '{}' is not a struct or union", other),
                ))
            }
        }

        let mut st = StructuredType::new(name).with_size(raw.size);
        match &raw.fields {
            RawFields::Keyed(fields) => {
                for (field_name, field) in fields {
                    st.members
                        .push(self.parse_member(resolver, name, Some(field_name.as_str()), field)?);
                }
                // Object keys carry no order; layout order is by offset.
                st.members.sort_by_key(|m| m.offset_bytes);
            }
            RawFields::Listed(fields) => {
                for field in fields {
                    st.members.push(self.parse_member(resolver, name, None, field)?);
                }
            }
        }
        Ok(st)
    }

    fn parse_member(
        &self,
        resolver: &Resolver<'_>,
        owner: &str,
        key: Option<&str>,
        value: &Value,
    ) -> QueryResult<MemberDescriptor> {
        let field: Option<RawField> = serde_json::from_value(value.clone()).ok();
        let name = key
            .map(str::to_string)
            .or_else(|| field.as_ref().and_then(|f| f.name.clone()))
            .unwrap_or_else(|| UNKNOWN_SENTINEL.to_string());

        let field = match field {
            Some(field) => field,
            None => {
                warn!(owner, member = %name, "member entry is not an object");
                return Ok(MemberDescriptor::new(name).invalidated());
            }
        };

        // Type given under "type" (description or bare tag), or inline on the entry.
        let type_value = match &field.ty {
            Some(Value::String(tag)) => {
                let mut inline = value.clone();
                if let Some(entry) = inline.as_object_mut() {
                    entry.remove("type");
                    entry.insert("kind".to_string(), Value::String(tag.clone()));
                }
                inline
            }
            Some(ty) => ty.clone(),
            None => value.clone(),
        };
        let resolved = match serde_json::from_value::<RawType>(type_value) {
            Ok(ty) => resolver.resolve(&ty),
            Err(err) => {
                warn!(owner, member = %name, error = %err, "unreadable member type");
                return Ok(MemberDescriptor::new(name)
                    .with_layout(field.offset.unwrap_or(0), 0)
                    .invalidated());
            }
        };

        if let Some(reason) = &resolved.invalid_reason {
            warn!(owner, member = %name, reason = %reason, "member marked not decodable");
        }

        let mut member = resolved.into_member(name, field.offset.unwrap_or(0))?;

        if field.offset.is_none() {
            warn!(owner, member = %member.name, "member without offset");
            member.is_valid = false;
        }

        if self.options.verbose {
            info!("{}", member);
        } else {
            trace!("{}", member);
        }
        Ok(member)
    }

    fn load_symbols(
        &self,
        registry: &mut TypeRegistry,
        root: &Map<String, Value>,
        report: &mut LoadReport,
    ) {
        let symbols = match root.get("symbols") {
            Some(Value::Object(symbols)) => symbols,
            Some(_) => {
                report.skip("symbols", QueryError::malformed("symbols", "not an object"));
                return;
            }
            None => return,
        };

        for (name, value) in symbols {
            let symbol: RawSymbol = match serde_json::from_value(value.clone()) {
                Ok(symbol) => symbol,
                Err(err) => {
                    report.skip(name.clone(), QueryError::malformed(name, err.to_string()));
                    continue;
                }
            };
            if !symbol.is_function() {
                continue;
            }
            match symbol.address {
                Some(address) => {
                    registry.register_function(Address::new(address), name.clone());
                    report.functions_loaded += 1;
                    debug!(name = %name, address = %Address::new(address), "registered function");
                }
                None => report.skip(
                    name.clone(),
                    QueryError::malformed(name, "function symbol without address"),
                ),
            }
        }
    }
}

/// Loads `root` into `registry` with default options
pub fn load(registry: &mut TypeRegistry, root: &Value) -> QueryResult<LoadReport> {
    MetadataLoader::default().load(registry, root)
}

/// Parses a name-keyed table leniently, skipping unreadable entries
fn parse_table<T: serde::de::DeserializeOwned>(
    root: &Map<String, Value>,
    key: &str,
    report: &mut LoadReport,
) -> HashMap<String, T> {
    let mut table = HashMap::new();
    match root.get(key) {
        Some(Value::Object(entries)) => {
            for (name, value) in entries {
                match serde_json::from_value::<T>(value.clone()) {
                    Ok(entry) => {
                        table.insert(name.clone(), entry);
                    }
                    Err(err) => report.skip(
                        format!("{}.{}", key, name),
                        QueryError::malformed(name, err.to_string()),
                    ),
                }
            }
        }
        Some(_) => report.skip(key, QueryError::malformed(key, "not an object")),
        None => {}
    }
    table
}

/// Struct entries in document order, each paired with its name
fn collect_struct_entries<'v>(
    root: &'v Map<String, Value>,
    report: &mut LoadReport,
) -> Vec<(String, &'v Value)> {
    match root.get("user_types") {
        Some(Value::Object(types)) => types.iter().map(|(n, v)| (n.clone(), v)).collect(),
        Some(Value::Array(types)) => {
            let mut entries = Vec::with_capacity(types.len());
            for (index, value) in types.iter().enumerate() {
                match value.get("name").and_then(Value::as_str) {
                    Some(name) if !name.is_empty() => entries.push((name.to_string(), value)),
                    _ => report.skip(
                        format!("user_types[{}]", index),
                        QueryError::malformed(format!("user_types[{}]", index), "missing name"),
                    ),
                }
            }
            entries
        }
        Some(_) => {
            report.skip(
                "user_types",
                QueryError::malformed("user_types", "neither an object nor an array"),
            );
            Vec::new()
        }
        None => Vec::new(),
    }
}
