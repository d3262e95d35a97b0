//! Prelude module for convenient imports.
//!
//! ```ignore
//! use lattice::prelude::*;
//! ```

// Schema types
pub use lattice_schema::{
    LoadError, QualifiedName, SchemaDocument, SchemaError, SchemaIr, TypeReference, TypeTables,
    load_schema, parse_schema,
};

// Code generation
pub use lattice_codegen::{
    BaseInterfaces, CodegenError, CompilationSession, Diagnostic, ExtensionRegistry,
    GeneratedCode, Generator, GeneratorOptions, MethodSignature, generate_from_file,
    generate_from_yaml,
};
