//! Built-in `core` schema.
//!
//! Every translation can use the core primitives without listing `core` under
//! `References`. Types are placed in the `core_ns` namespace.

use crate::types::{DataTypeDef, ObjectDef, PrimitiveKind, SchemaDocument, StringTypeDef};
use std::sync::OnceLock;

/// Name of the built-in schema.
pub const CORE_SCHEMA_NAME: &str = "core";

const CORE_DATA_TYPES: &[(&str, PrimitiveKind, &str)] = &[
    ("Integer", PrimitiveKind::Integer, "An integer number"),
    ("Numeric", PrimitiveKind::Number, "A number with or without a decimal"),
    ("Boolean", PrimitiveKind::Boolean, "True or false"),
    ("String", PrimitiveKind::String, "A sequence of characters"),
];

const CORE_STRING_TYPES: &[(&str, &str)] = &[
    ("UUID", "An effectively unique character string conforming to ITU-T Recommendation X.667"),
    ("Date", "A calendar date formatted per ISO 8601"),
    ("Timestamp", "Date with UTC time formatted per ISO 8601"),
    ("Version", "Version identifier in the form major.minor.patch"),
    ("Pattern", "A regular expression string"),
];

/// Returns the built-in core schema document.
#[must_use]
pub fn core_schema() -> &'static SchemaDocument {
    static CORE: OnceLock<SchemaDocument> = OnceLock::new();
    CORE.get_or_init(build_core_schema)
}

fn build_core_schema() -> SchemaDocument {
    let mut doc = SchemaDocument::new(CORE_SCHEMA_NAME);
    for (name, kind, description) in CORE_DATA_TYPES {
        doc.add_object(
            *name,
            ObjectDef::DataType(DataTypeDef {
                kind: *kind,
                description: Some((*description).to_string()),
            }),
        );
    }
    for (name, description) in CORE_STRING_TYPES {
        doc.add_object(
            *name,
            ObjectDef::StringType(StringTypeDef {
                description: Some((*description).to_string()),
                pattern: None,
            }),
        );
    }
    doc
}
