//! Generator options and the compilation session.

use crate::cpp::extensions::ExtensionRegistry;
use crate::error::CodegenError;
use crate::interfaces::BaseInterfaces;
use serde::Deserialize;
use std::sync::Arc;

/// Conventions of the generated C++ and of the runtime it links against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneratorOptions {
    /// Outermost namespace wrapping every schema namespace.
    pub top_namespace: String,
    /// Type of the injected logger handle.
    pub logger_type: String,
    /// JSON value type passed to deserialization functions.
    pub json_type: String,
    /// Includes every generated header starts with.
    pub standard_includes: Vec<String>,
    /// Comment placed above the top namespace.
    pub generated_note: String,
    /// Header providing `json_get` to implementation files.
    pub support_include: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            top_namespace: "lattice".to_string(),
            logger_type: "std::shared_ptr<Courier::Courier>".to_string(),
            json_type: "nlohmann::json".to_string(),
            standard_includes: [
                "string",
                "vector",
                "nlohmann/json.hpp",
                "enum-info.h",
                "courier/courier.h",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            generated_note:
                "/// @note  This class has been auto-generated. Local changes will not be saved!"
                    .to_string(),
            support_include: "load-object.h".to_string(),
        }
    }
}

impl GeneratorOptions {
    /// Starts building options from the defaults.
    #[must_use]
    pub fn builder() -> GeneratorOptionsBuilder {
        GeneratorOptionsBuilder::new()
    }

    /// Reads options from YAML; absent keys keep their defaults.
    ///
    /// # Errors
    /// Returns `CodegenError::Options` if the YAML is malformed.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CodegenError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Returns the parameter declaration of the JSON argument (`const nlohmann::json& j`).
    #[must_use]
    pub fn json_parameter(&self) -> String {
        format!("const {}& j", self.json_type)
    }
}

/// Builder for [`GeneratorOptions`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptionsBuilder {
    options: GeneratorOptions,
}

impl GeneratorOptionsBuilder {
    /// Creates a builder holding the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the top-level namespace.
    #[must_use]
    pub fn top_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.options.top_namespace = namespace.into();
        self
    }

    /// Sets the logger handle type.
    #[must_use]
    pub fn logger_type(mut self, logger_type: impl Into<String>) -> Self {
        self.options.logger_type = logger_type.into();
        self
    }

    /// Sets the JSON value type.
    #[must_use]
    pub fn json_type(mut self, json_type: impl Into<String>) -> Self {
        self.options.json_type = json_type.into();
        self
    }

    /// Appends a standard include.
    #[must_use]
    pub fn standard_include(mut self, include: impl Into<String>) -> Self {
        self.options.standard_includes.push(include.into());
        self
    }

    /// Sets the auto-generated note.
    #[must_use]
    pub fn generated_note(mut self, note: impl Into<String>) -> Self {
        self.options.generated_note = note.into();
        self
    }

    /// Sets the implementation support include.
    #[must_use]
    pub fn support_include(mut self, include: impl Into<String>) -> Self {
        self.options.support_include = include.into();
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> GeneratorOptions {
        self.options
    }
}

/// Context threaded through one or more translations.
///
/// The extension registry is frozen before any session is created, so
/// sessions may be shared across threads translating independent schemas.
#[derive(Debug, Clone, Default)]
pub struct CompilationSession {
    options: GeneratorOptions,
    extensions: Arc<ExtensionRegistry>,
    interfaces: BaseInterfaces,
}

impl CompilationSession {
    /// Creates a session with no extensions and no base-class interfaces.
    #[must_use]
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            extensions: Arc::new(ExtensionRegistry::default()),
            interfaces: BaseInterfaces::new(),
        }
    }

    /// Sets the extension registry.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Arc<ExtensionRegistry>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Sets the base-class interface table.
    ///
    /// Every external template a translated schema derives from should have
    /// an entry; missing entries are reported as diagnostics.
    #[must_use]
    pub fn with_interfaces(mut self, interfaces: BaseInterfaces) -> Self {
        self.interfaces = interfaces;
        self
    }

    /// Returns the generator options.
    #[must_use]
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Returns the extension registry.
    #[must_use]
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Returns the base-class interfaces.
    #[must_use]
    pub fn interfaces(&self) -> &BaseInterfaces {
        &self.interfaces
    }
}
