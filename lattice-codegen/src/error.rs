//! Error types for code generation.

use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Schema loading error.
    #[error("schema load error: {0}")]
    Load(#[from] lattice_schema::LoadError),

    /// Schema resolution or validation error.
    #[error("schema error: {0}")]
    Schema(#[from] lattice_schema::SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generator options could not be read.
    #[error("invalid generator options: {0}")]
    Options(#[from] serde_yaml::Error),

    /// Sibling declarations reference each other, so no declare-before-use
    /// order exists.
    #[error("cyclic declarations in namespace '{namespace}': {}", names.join(", "))]
    CyclicDeclarations {
        /// Namespace whose children could not be ordered.
        namespace: String,
        /// Declarations taking part in the cycle, in original order.
        names: Vec<String>,
    },

    /// An extension hook failed.
    #[error("extension for template '{template}' failed: {message}")]
    Extension {
        /// Template the extension is registered for.
        template: String,
        /// Error message.
        message: String,
    },

    /// Code generation error.
    #[error("generation error: {message}")]
    Generation {
        /// Error message.
        message: String,
    },
}

impl CodegenError {
    /// Creates a generation error with the given message.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Creates an extension error.
    pub fn extension(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extension {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Attributes a hook failure to the template the hook is registered for.
    /// Errors that already name a template are returned unchanged.
    #[must_use]
    pub fn in_extension(self, template: &str) -> Self {
        match self {
            Self::Extension { .. } => self,
            other => Self::extension(template, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_declarations_display() {
        let err = CodegenError::CyclicDeclarations {
            namespace: "fan_ns".to_string(),
            names: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "cyclic declarations in namespace 'fan_ns': A, B");
    }

    #[test]
    fn test_schema_error_conversion() {
        let err: CodegenError =
            lattice_schema::SchemaError::unresolved("fan", "speed", "Velocity").into();
        assert!(matches!(err, CodegenError::Schema(_)));
        assert!(err.to_string().contains("Velocity"));
    }

    #[test]
    fn test_in_extension_wraps_hook_failure() {
        let err = CodegenError::generation("grid has no axes").in_extension("GridVariablesTemplate");
        assert!(matches!(
            &err,
            CodegenError::Extension { template, message }
                if template == "GridVariablesTemplate" && message.contains("grid has no axes")
        ));
    }

    #[test]
    fn test_in_extension_keeps_attribution() {
        let err = CodegenError::extension("RatingTemplate", "bad rating").in_extension("OtherTemplate");
        assert_eq!(
            err.to_string(),
            "extension for template 'RatingTemplate' failed: bad rating"
        );
    }
}
