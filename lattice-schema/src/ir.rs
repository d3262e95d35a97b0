//! Intermediate representation for code generation.
//!
//! This module provides a resolved representation of one schema document:
//! every data element carries its [`TypeReference`] and every derived group
//! names its qualified base template.

use crate::error::SchemaError;
use crate::grammar::{QualifiedName, TypeReference, TypeResolver};
use crate::references::TypeTables;
use crate::types::{ObjectDef, Required, SchemaDocument};
use crate::validation::validate_document;
use heck::{ToKebabCase, ToSnakeCase};

/// Returns the C++ namespace for a schema (`RS0003` -> `rs0003_ns`).
#[must_use]
pub fn namespace_name(schema: &str) -> String {
    format!("{}_ns", snake_style(schema))
}

/// Converts a name to `snake_case`.
#[must_use]
pub fn snake_style(name: &str) -> String {
    name.to_snake_case()
}

/// Converts a name to `kebab-case` (used for header file names).
#[must_use]
pub fn kebab_style(name: &str) -> String {
    name.to_kebab_case()
}

/// Intermediate representation of a schema for code generation.
#[derive(Debug, Clone)]
pub struct SchemaIr {
    /// Schema name.
    pub schema_name: String,
    /// C++ namespace of the schema.
    pub namespace: String,
    /// Meta information, if the document has a Meta object.
    pub meta: Option<ResolvedMeta>,
    /// Referenced schema names.
    pub references: Vec<String>,
    /// String types, emitted as typedefs.
    pub string_types: Vec<ResolvedStringType>,
    /// Enumerations.
    pub enumerations: Vec<ResolvedEnum>,
    /// Data group templates declared in this document.
    pub templates: Vec<ResolvedTemplate>,
    /// Data groups with resolved element types.
    pub data_groups: Vec<ResolvedGroup>,
}

impl SchemaIr {
    /// Creates an intermediate representation from a loaded document.
    ///
    /// `tables` must contain the document itself and all schemas it references.
    ///
    /// # Errors
    /// Returns `SchemaError` if validation or type resolution fails.
    pub fn from_document(document: &SchemaDocument, tables: &TypeTables) -> Result<Self, SchemaError> {
        validate_document(document, tables)?;

        let resolver = TypeResolver::new(tables, &document.name);
        let mut ir = Self {
            schema_name: document.name.clone(),
            namespace: namespace_name(&document.name),
            meta: document.meta().map(|(tag, meta)| ResolvedMeta {
                tag: tag.to_string(),
                title: meta.title.clone(),
                version: meta.version.clone(),
                description: meta.description.clone(),
                root_data_group: meta.root_data_group.clone(),
            }),
            references: document.references().to_vec(),
            string_types: Vec::new(),
            enumerations: Vec::new(),
            templates: Vec::new(),
            data_groups: Vec::new(),
        };

        for (name, object) in &document.objects {
            match object {
                ObjectDef::StringType(def) => ir.string_types.push(ResolvedStringType {
                    name: name.clone(),
                    description: def.description.clone(),
                }),
                ObjectDef::Enumeration(def) => ir.enumerations.push(ResolvedEnum {
                    name: name.clone(),
                    enumerators: def
                        .enumerators
                        .iter()
                        .map(|(e, d)| ResolvedEnumerator {
                            name: e.clone(),
                            display_text: d.display_text.clone(),
                            description: d.description.clone(),
                        })
                        .collect(),
                }),
                ObjectDef::DataGroupTemplate(def) => ir.templates.push(ResolvedTemplate {
                    name: name.clone(),
                    description: def.description.clone(),
                }),
                ObjectDef::DataGroup(def) => {
                    let template = def
                        .template
                        .as_deref()
                        .map(|t| {
                            tables
                                .referenced(t)
                                .map(|entry| {
                                    QualifiedName::new(&entry.name, &entry.schema, &entry.namespace)
                                })
                                .ok_or_else(|| SchemaError::UnknownTemplate {
                                    schema: document.name.clone(),
                                    group: name.clone(),
                                    template: t.to_string(),
                                })
                        })
                        .transpose()?;

                    let mut elements = Vec::with_capacity(def.data_elements.len());
                    for (element_name, element) in &def.data_elements {
                        let ty = resolver.resolve_element(element_name, element, &def.data_elements)?;
                        tracing::debug!(
                            "Resolved {}.{} as {}",
                            name,
                            element_name,
                            ty.cpp_type()
                        );
                        elements.push(ResolvedElement {
                            name: element_name.clone(),
                            ty,
                            required: element.required.clone(),
                            units: element.units.clone(),
                            description: element.description.clone(),
                            notes: element.notes.clone(),
                        });
                    }

                    ir.data_groups.push(ResolvedGroup {
                        name: name.clone(),
                        template,
                        elements,
                    });
                }
                ObjectDef::Meta(_) | ObjectDef::DataType(_) => {}
            }
        }

        Ok(ir)
    }

    /// Resolves a document against the core schema and the given references.
    ///
    /// # Errors
    /// Returns `SchemaError` if validation or type resolution fails.
    pub fn build(document: &SchemaDocument, references: &[SchemaDocument]) -> Result<Self, SchemaError> {
        let tables = TypeTables::for_document(document, references);
        Self::from_document(document, &tables)
    }

    /// Gets a data group by name.
    #[must_use]
    pub fn get_group(&self, name: &str) -> Option<&ResolvedGroup> {
        self.data_groups.iter().find(|g| g.name == name)
    }

    /// Gets an enumeration by name.
    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&ResolvedEnum> {
        self.enumerations.iter().find(|e| e.name == name)
    }

    /// Returns true if the template is declared in this document.
    #[must_use]
    pub fn declares_template(&self, name: &str) -> bool {
        self.templates.iter().any(|t| t.name == name)
    }

    /// Returns the include guard macro (`fan` -> `FAN_H_`).
    #[must_use]
    pub fn include_guard(&self) -> String {
        format!("{}_H_", snake_style(&self.schema_name).to_uppercase())
    }

    /// Returns the header file name (`RS0003` -> `rs0003.h`).
    #[must_use]
    pub fn header_name(&self) -> String {
        format!("{}.h", kebab_style(&self.schema_name))
    }
}

/// Resolved Meta object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMeta {
    /// Object name the Meta record was declared under.
    pub tag: String,
    /// Title.
    pub title: Option<String>,
    /// Version.
    pub version: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Root data group.
    pub root_data_group: Option<String>,
}

/// Resolved String Type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStringType {
    /// Type name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

/// Resolved enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnum {
    /// Enumeration name.
    pub name: String,
    /// Enumerators, in declaration order.
    pub enumerators: Vec<ResolvedEnumerator>,
}

/// Resolved enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnumerator {
    /// Enumerator name.
    pub name: String,
    /// Display text.
    pub display_text: Option<String>,
    /// Description.
    pub description: Option<String>,
}

/// Data group template declared in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    /// Template name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

/// Data group with resolved elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    /// Group name.
    pub name: String,
    /// Qualified base template.
    pub template: Option<QualifiedName>,
    /// Elements, in declaration order.
    pub elements: Vec<ResolvedElement>,
}

impl ResolvedGroup {
    /// Gets an element by name.
    #[must_use]
    pub fn get_element(&self, name: &str) -> Option<&ResolvedElement> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// Data element with its resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedElement {
    /// Element name.
    pub name: String,
    /// Resolved type.
    pub ty: TypeReference,
    /// Requiredness (conditional expressions are stored, not evaluated).
    pub required: Required,
    /// Units.
    pub units: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Notes.
    pub notes: Vec<String>,
}
