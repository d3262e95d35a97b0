//! # Lattice Schema
//!
//! Schema DSL document model, type resolution and intermediate representation.
//!
//! This crate provides:
//! - Loading YAML schema documents into a typed object model
//! - The built-in `core` schema of primitive and string types
//! - Lookup tables over a schema and the schemas it references
//! - The `Data Type` grammar resolver, including discriminated alternations
//! - Schema validation
//! - Intermediate representation for code generation

pub mod builtin;
pub mod error;
pub mod grammar;
pub mod ir;
pub mod parser;
pub mod references;
pub mod types;
pub mod validation;

pub use builtin::{CORE_SCHEMA_NAME, core_schema};
pub use error::{LoadError, SchemaError};
pub use grammar::{Alternation, QualifiedName, SelectorCase, TypeReference, TypeResolver};
pub use ir::{
    ResolvedElement, ResolvedEnum, ResolvedEnumerator, ResolvedGroup, ResolvedMeta,
    ResolvedStringType, ResolvedTemplate, SchemaIr, kebab_style, namespace_name, snake_style,
};
pub use parser::{load_schema, parse_schema, schema_name_from_path};
pub use references::{LookupEntry, ReferencedKind, ReferencedType, TypeLookup, TypeTables};
pub use types::{
    DataElementDef, DataGroupDef, EnumerationDef, EnumeratorDef, MetaDef, ObjectDef, ObjectType,
    PrimitiveKind, Required, SchemaDocument,
};
pub use validation::validate_document;
