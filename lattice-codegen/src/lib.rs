//! # Lattice Codegen
//!
//! C++ code generation from Lattice schemas.
//!
//! This crate provides:
//! - The declaration tree and its dependency ordering
//! - Polymorphic member expansion and dispatch
//! - The implementation tree of `from_json` bodies and initializers
//! - Per-template extensions and base-class interface descriptors
//! - A compilation session threading options through translation

pub mod cpp;
pub mod diagnostic;
pub mod error;
pub mod generator;
pub mod interfaces;
pub mod session;
pub mod support;

pub use cpp::extensions::{ExtensionRegistry, ExtensionRegistryBuilder};
pub use diagnostic::Diagnostic;
pub use error::CodegenError;
pub use generator::{GeneratedCode, Generator};
pub use interfaces::{BaseInterfaces, MethodSignature, scan_header};
pub use session::{CompilationSession, GeneratorOptions, GeneratorOptionsBuilder};

use lattice_schema::{SchemaDocument, SchemaIr};
use std::path::Path;

/// Generates C++ code from a schema given as YAML text.
///
/// # Arguments
/// * `yaml` - Schema document content
/// * `schema_name` - Name of the schema (`fan` for `fan.schema.yaml`)
/// * `references` - Documents named in the schema's `References`
/// * `session` - Options, extensions and base-class interfaces
///
/// # Errors
/// Returns `CodegenError` if parsing, resolution or generation fails.
pub fn generate_from_yaml(
    yaml: &str,
    schema_name: &str,
    references: &[SchemaDocument],
    session: &CompilationSession,
) -> Result<GeneratedCode, CodegenError> {
    let document = lattice_schema::parse_schema(yaml, schema_name)?;
    let ir = SchemaIr::build(&document, references)?;
    Generator::new(session).generate(&ir)
}

/// Generates C++ code from a schema file.
///
/// Each referenced schema is read from `<dir>/<reference>.schema.yaml` next
/// to the file.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, resolution or generation fails.
pub fn generate_from_file(path: &Path, session: &CompilationSession) -> Result<GeneratedCode, CodegenError> {
    let document = read_schema(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut references = Vec::with_capacity(document.references().len());
    for reference in document.references() {
        let reference_path = dir.join(format!("{reference}.schema.yaml"));
        tracing::debug!("Loading reference {} from {}", reference, reference_path.display());
        references.push(read_schema(&reference_path)?);
    }

    let ir = SchemaIr::build(&document, &references)?;
    Generator::new(session).generate(&ir)
}

fn read_schema(path: &Path) -> Result<SchemaDocument, CodegenError> {
    let yaml = std::fs::read_to_string(path)?;
    let name = lattice_schema::schema_name_from_path(path);
    Ok(lattice_schema::parse_schema(&yaml, &name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CORE_TYPES: &str = r#"
Schema:
  Object Type: "Meta"
  Title: "Shared types"
RatingTemplate:
  Object Type: "Data Group Template"
  Data Elements:
    rating:
      Data Type: "Numeric"
OperationState:
  Object Type: "Enumeration"
  Enumerators:
    NORMAL:
      Display Text: "Normal"
    STANDBY:
      Display Text: "Standby"
"#;

    const PUMP: &str = r#"
Schema:
  Object Type: "Meta"
  Title: "Pump"
  References:
    - shared
Pump:
  Object Type: "Data Group"
  Data Group Template: "RatingTemplate"
  Data Elements:
    state:
      Data Type: "<OperationState>"
      Required: true
"#;

    #[test]
    fn test_generate_from_yaml() {
        let shared = lattice_schema::parse_schema(CORE_TYPES, "shared").expect("Failed to parse");
        let session = CompilationSession::default();
        let code = generate_from_yaml(PUMP, "pump", &[shared], &session).expect("Failed to generate");

        assert!(code.header.contains("#include <shared.h>"));
        assert!(code.header.contains("\t\t\tshared_ns::OperationState state;"));
        assert!(code.header.contains("struct Pump : shared_ns::RatingTemplate {"));
        assert_eq!(code.diagnostics.len(), 1);
    }

    #[test]
    fn test_generate_from_yaml_unresolved_type() {
        let result = generate_from_yaml(PUMP, "pump", &[], &CompilationSession::default());
        assert!(matches!(result, Err(CodegenError::Schema(_))));
    }

    #[test]
    fn test_generate_from_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("shared.schema.yaml"), CORE_TYPES).expect("Failed to write");
        let path = dir.path().join("pump.schema.yaml");
        fs::write(&path, PUMP).expect("Failed to write");

        let session = CompilationSession::default().with_interfaces(BaseInterfaces::new().with(
            "RatingTemplate",
            vec![MethodSignature::new("void", "initialize", ["const nlohmann::json& j"])],
        ));
        let code = generate_from_file(&path, &session).expect("Failed to generate");

        assert_eq!(code.header_name, "pump.h");
        assert!(code.is_clean());
        assert!(code.implementation.contains("void Pump::initialize(const nlohmann::json& j) {"));
    }

    #[test]
    fn test_generate_from_file_missing_reference() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("pump.schema.yaml");
        fs::write(&path, PUMP).expect("Failed to write");

        let result = generate_from_file(&path, &CompilationSession::default());
        assert!(matches!(result, Err(CodegenError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_generate_from_file_invalid_yaml() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("pump.schema.yaml");
        fs::write(&path, "Schema: [unclosed").expect("Failed to write");

        let result = generate_from_file(&path, &CompilationSession::default());
        assert!(matches!(result, Err(CodegenError::Load(_))));
    }
}
