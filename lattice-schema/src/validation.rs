//! Schema validation utilities.
//!
//! Structural checks run before type resolution. Selector constraints are
//! validated by the type resolver, which already has the resolved
//! discriminant at hand.

use crate::error::SchemaError;
use crate::references::TypeTables;
use crate::types::{EnumerationDef, ObjectDef, SchemaDocument};

/// Enumerator synthesized by code generation for unrecognized values.
pub const UNKNOWN_ENUMERATOR: &str = "UNKNOWN";

/// Validates a loaded document against its lookup tables.
///
/// # Errors
/// Returns `SchemaError` if validation fails.
pub fn validate_document(document: &SchemaDocument, tables: &TypeTables) -> Result<(), SchemaError> {
    for (name, object) in &document.objects {
        match object {
            ObjectDef::Enumeration(def) => validate_enumeration(&document.name, name, def)?,
            ObjectDef::DataGroup(def) => {
                if let Some(template) = &def.template {
                    if !tables.is_template(template) {
                        return Err(SchemaError::UnknownTemplate {
                            schema: document.name.clone(),
                            group: name.clone(),
                            template: template.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((_, meta)) = document.meta() {
        if let Some(root) = &meta.root_data_group {
            if !matches!(document.get(root), Some(ObjectDef::DataGroup(_))) {
                return Err(SchemaError::validation(
                    &document.name,
                    format!("root data group '{root}' is not a data group of this schema"),
                ));
            }
        }
    }

    Ok(())
}

/// Validates an enumeration definition.
fn validate_enumeration(schema: &str, name: &str, def: &EnumerationDef) -> Result<(), SchemaError> {
    if def.enumerators.is_empty() {
        return Err(SchemaError::validation(
            schema,
            format!("enumeration '{name}' has no enumerators"),
        ));
    }
    if def.has_enumerator(UNKNOWN_ENUMERATOR) {
        return Err(SchemaError::validation(
            schema,
            format!("enumeration '{name}' declares the reserved enumerator '{UNKNOWN_ENUMERATOR}'"),
        ));
    }
    Ok(())
}
