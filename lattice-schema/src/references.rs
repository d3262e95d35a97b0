//! Type lookup tables built from a schema and the schemas it references.
//!
//! Tables are filled in registration order. When two schemas declare the same
//! name the last registration wins; a warning is logged so the ambiguity is
//! visible, but no attempt is made to pick a "better" definition.

use crate::builtin::core_schema;
use crate::ir::namespace_name;
use crate::types::{ObjectDef, SchemaDocument};
use indexmap::{IndexMap, IndexSet};

/// Kind of a type declared in some schema and referenceable by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferencedKind {
    /// Enumeration with its enumerator names.
    Enumeration {
        /// Enumerator names in declaration order.
        enumerators: Vec<String>,
    },
    /// Data group, with the template it derives from.
    DataGroup {
        /// Base template, if any.
        template: Option<String>,
    },
    /// Data group template.
    Template,
}

/// A named type together with the schema that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedType {
    /// Unqualified type name.
    pub name: String,
    /// Owning schema name.
    pub schema: String,
    /// C++ namespace of the owning schema.
    pub namespace: String,
    /// Kind of type.
    pub kind: ReferencedKind,
}

impl ReferencedType {
    /// Returns the namespace-qualified C++ name.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.namespace, self.name)
    }
}

/// Result of looking a plain name up in the tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupEntry<'a> {
    /// A named type owned by some schema.
    Referenced(&'a ReferencedType),
    /// A primitive, mapped to its C++ type.
    Primitive(&'a str),
}

/// Name resolution seam used by the type grammar resolver.
pub trait TypeLookup {
    /// Looks up a type name, searching referenced types before primitives.
    fn lookup(&self, name: &str) -> Option<LookupEntry<'_>>;

    /// Returns the template the named data group derives from.
    fn template_of(&self, name: &str) -> Option<&str>;
}

/// Lookup tables for one translation.
#[derive(Debug, Clone, Default)]
pub struct TypeTables {
    primitives: IndexMap<String, String>,
    referenced: IndexMap<String, ReferencedType>,
    derived: IndexMap<String, String>,
    templates: IndexSet<String>,
    schemas: Vec<String>,
}

impl TypeTables {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds tables for `document`, the built-in core schema and `references`,
    /// registered in that order.
    #[must_use]
    pub fn for_document(document: &SchemaDocument, references: &[SchemaDocument]) -> Self {
        let core = core_schema();
        let mut documents: Vec<&SchemaDocument> = vec![document];
        if document.name != core.name {
            documents.push(core);
        }
        documents.extend(references.iter().filter(|r| r.name != document.name));
        Self::from_documents(&documents)
    }

    /// Builds tables from documents in registration order.
    #[must_use]
    pub fn from_documents(documents: &[&SchemaDocument]) -> Self {
        let mut tables = Self::new();
        for document in documents {
            tables.register_document(document);
        }
        tables
    }

    /// Registers every referenceable type of a document.
    pub fn register_document(&mut self, document: &SchemaDocument) {
        let namespace = namespace_name(&document.name);
        tracing::debug!("Registering types of schema '{}' as {}", document.name, namespace);

        for (name, object) in &document.objects {
            let kind = match object {
                ObjectDef::DataType(def) => {
                    self.insert_primitive(&document.name, name, def.kind.cpp_type());
                    continue;
                }
                ObjectDef::StringType(_) => {
                    self.insert_primitive(&document.name, name, "std::string");
                    continue;
                }
                ObjectDef::Meta(_) => continue,
                ObjectDef::Enumeration(def) => ReferencedKind::Enumeration {
                    enumerators: def.enumerators.keys().cloned().collect(),
                },
                ObjectDef::DataGroup(def) => {
                    if let Some(template) = &def.template {
                        self.derived.insert(name.clone(), template.clone());
                    }
                    ReferencedKind::DataGroup {
                        template: def.template.clone(),
                    }
                }
                ObjectDef::DataGroupTemplate(_) => {
                    self.templates.insert(name.clone());
                    ReferencedKind::Template
                }
            };

            let entry = ReferencedType {
                name: name.clone(),
                schema: document.name.clone(),
                namespace: namespace.clone(),
                kind,
            };
            if let Some(previous) = self.referenced.insert(name.clone(), entry) {
                if previous.schema != document.name {
                    tracing::warn!(
                        "Type '{}' from schema '{}' replaces the one from schema '{}'",
                        name,
                        document.name,
                        previous.schema
                    );
                }
            }
        }

        if !self.schemas.contains(&document.name) {
            self.schemas.push(document.name.clone());
        }
    }

    fn insert_primitive(&mut self, schema: &str, name: &str, cpp_type: &str) {
        if let Some(previous) = self.primitives.insert(name.to_string(), cpp_type.to_string()) {
            if previous != cpp_type {
                tracing::warn!(
                    "Primitive '{}' redefined by schema '{}' ({} -> {})",
                    name,
                    schema,
                    previous,
                    cpp_type
                );
            }
        }
    }

    /// Returns the referenced type entry for a name.
    #[must_use]
    pub fn referenced(&self, name: &str) -> Option<&ReferencedType> {
        self.referenced.get(name)
    }

    /// Returns the C++ type of a primitive.
    #[must_use]
    pub fn primitive(&self, name: &str) -> Option<&str> {
        self.primitives.get(name).map(String::as_str)
    }

    /// Returns true if the name is a known data group template.
    #[must_use]
    pub fn is_template(&self, name: &str) -> bool {
        self.templates.contains(name)
    }

    /// Returns the names of registered schemas, in registration order.
    #[must_use]
    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }
}

impl TypeLookup for TypeTables {
    fn lookup(&self, name: &str) -> Option<LookupEntry<'_>> {
        if let Some(entry) = self.referenced.get(name) {
            return Some(LookupEntry::Referenced(entry));
        }
        // "Numeric/Null" and "Numeric" both name the Numeric primitive
        let base = name.split('/').next().unwrap_or(name);
        self.primitives
            .get(base)
            .map(|cpp| LookupEntry::Primitive(cpp.as_str()))
    }

    fn template_of(&self, name: &str) -> Option<&str> {
        let unscoped = name.rsplit("::").next().unwrap_or(name);
        self.derived.get(unscoped).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;

    fn fan_document() -> SchemaDocument {
        parse_schema(
            r#"
SpeedControlType:
  Object Type: "Enumeration"
  Enumerators:
    DISCRETE:
    CONTINUOUS:
PerformanceMapTemplate:
  Object Type: "Data Group Template"
PerformanceMapContinuous:
  Object Type: "Data Group"
  Data Group Template: PerformanceMapTemplate
  Data Elements:
    grid_variables:
      Data Type: "[Numeric]"
"#,
            "fan",
        )
        .expect("Failed to parse")
    }

    #[test]
    fn test_core_primitives_registered() {
        let doc = fan_document();
        let tables = TypeTables::for_document(&doc, &[]);
        assert_eq!(tables.primitive("Numeric"), Some("double"));
        assert_eq!(tables.primitive("Integer"), Some("int"));
        assert_eq!(tables.primitive("UUID"), Some("std::string"));
        assert_eq!(tables.schemas(), ["fan".to_string(), "core".to_string()]);
    }

    #[test]
    fn test_lookup_prefers_referenced_types() {
        let doc = fan_document();
        let tables = TypeTables::for_document(&doc, &[]);

        match tables.lookup("SpeedControlType") {
            Some(LookupEntry::Referenced(entry)) => {
                assert_eq!(entry.qualified_name(), "fan_ns::SpeedControlType");
                assert_eq!(
                    entry.kind,
                    ReferencedKind::Enumeration {
                        enumerators: vec!["DISCRETE".to_string(), "CONTINUOUS".to_string()]
                    }
                );
            }
            other => panic!("unexpected lookup result: {other:?}"),
        }
        assert_eq!(
            tables.lookup("Numeric/Null"),
            Some(LookupEntry::Primitive("double"))
        );
        assert!(tables.lookup("Missing").is_none());
    }

    #[test]
    fn test_template_of() {
        let doc = fan_document();
        let tables = TypeTables::for_document(&doc, &[]);
        assert!(tables.is_template("PerformanceMapTemplate"));
        assert_eq!(
            tables.template_of("PerformanceMapContinuous"),
            Some("PerformanceMapTemplate")
        );
        assert_eq!(
            tables.template_of("fan_ns::PerformanceMapContinuous"),
            Some("PerformanceMapTemplate")
        );
        assert_eq!(tables.template_of("SpeedControlType"), None);
    }

    #[test]
    fn test_last_registration_wins() {
        let first = parse_schema(
            "Shared:\n  Object Type: \"Enumeration\"\n  Enumerators:\n    A:\n",
            "first",
        )
        .expect("Failed to parse");
        let second = parse_schema(
            "Shared:\n  Object Type: \"Enumeration\"\n  Enumerators:\n    B:\n",
            "second",
        )
        .expect("Failed to parse");

        let tables = TypeTables::from_documents(&[&first, &second]);
        let entry = tables.referenced("Shared").expect("missing entry");
        assert_eq!(entry.schema, "second");
        assert_eq!(entry.namespace, "second_ns");
    }
}
