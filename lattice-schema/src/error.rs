//! Error types for schema loading, resolution and validation.

use thiserror::Error;

/// Error type for loading a schema document into the object model.
#[derive(Debug, Error)]
pub enum LoadError {
    /// YAML syntax error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing required key on an object record.
    #[error("missing required key '{key}' on object '{object}'")]
    MissingKey {
        /// Object name.
        object: String,
        /// Key name.
        key: String,
    },

    /// A key holds a value of the wrong shape.
    #[error("invalid value for key '{key}' on object '{object}': expected {expected}")]
    InvalidValue {
        /// Object name.
        object: String,
        /// Key name.
        key: String,
        /// Description of the expected value.
        expected: String,
    },

    /// Blank object type tag.
    #[error("unknown object type '{object_type}' on object '{object}'")]
    UnknownObjectType {
        /// Object name.
        object: String,
        /// Declared object type.
        object_type: String,
    },

    /// Invalid document structure.
    #[error("invalid schema structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },
}

/// Error type for type resolution and schema validation.
///
/// Any of these aborts translation of the schema document it was raised for;
/// other documents are unaffected.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Loading error.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// A data type name could not be found in any lookup table.
    #[error("unresolved type '{raw_type}' for field '{field}' in schema '{schema}'")]
    UnresolvedType {
        /// Schema name.
        schema: String,
        /// Data element name.
        field: String,
        /// Type string as written in the schema.
        raw_type: String,
    },

    /// Malformed type grammar or selector constraint.
    #[error("schema grammar error in '{schema}', field '{field}': {message}")]
    Grammar {
        /// Schema name.
        schema: String,
        /// Data element name.
        field: String,
        /// Error message.
        message: String,
    },

    /// A data group derives from a template that is not declared anywhere.
    #[error("data group '{group}' in schema '{schema}' derives from unknown template '{template}'")]
    UnknownTemplate {
        /// Schema name.
        schema: String,
        /// Data group name.
        group: String,
        /// Template name.
        template: String,
    },

    /// Validation error.
    #[error("validation error in '{schema}': {message}")]
    Validation {
        /// Schema name.
        schema: String,
        /// Error message.
        message: String,
    },
}

impl LoadError {
    /// Creates a missing key error.
    pub fn missing_key(object: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingKey {
            object: object.into(),
            key: key.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid(
        object: impl Into<String>,
        key: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            object: object.into(),
            key: key.into(),
            expected: expected.into(),
        }
    }
}

impl SchemaError {
    /// Creates an unresolved type error.
    pub fn unresolved(
        schema: impl Into<String>,
        field: impl Into<String>,
        raw_type: impl Into<String>,
    ) -> Self {
        Self::UnresolvedType {
            schema: schema.into(),
            field: field.into(),
            raw_type: raw_type.into(),
        }
    }

    /// Creates a grammar error.
    pub fn grammar(
        schema: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Grammar {
            schema: schema.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            schema: schema.into(),
            message: message.into(),
        }
    }
}
