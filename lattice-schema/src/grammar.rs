//! Type grammar resolver.
//!
//! Interprets `Data Type` strings:
//!
//! ```text
//! Name | {GroupName} | <EnumName> | [Type] | (Type, Type, ...)
//! ```
//!
//! Alternations additionally need a selector constraint of the form
//! `discriminant(ENUM_A, ENUM_B, ...)` naming a sibling element of
//! enumeration type.

use crate::error::SchemaError;
use crate::references::{LookupEntry, ReferencedKind, TypeLookup};
use crate::types::DataElementDef;
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// A namespace-qualified name of a type declared in some schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Unqualified name.
    pub name: String,
    /// Owning schema name.
    pub schema: String,
    /// C++ namespace of the owning schema.
    pub namespace: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    pub fn new(
        name: impl Into<String>,
        schema: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}::{}", self.namespace, self.name)
        }
    }
}

/// One alternative of an alternation: the enumerator selecting it and the
/// concrete data group it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorCase {
    /// Enumerator name, unqualified (e.g. `CONTINUOUS`).
    pub enumerator: String,
    /// Concrete data group.
    pub concrete: QualifiedName,
}

/// Resolved polymorphic alternation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternation {
    /// Name of the sibling discriminant element.
    pub discriminant: String,
    /// Enumeration type of the discriminant.
    pub discriminant_enum: QualifiedName,
    /// Alternatives paired positionally with the constraint's enumerators.
    pub cases: Vec<SelectorCase>,
    /// Template every alternative derives from.
    pub base_template: QualifiedName,
}

impl Alternation {
    /// Returns the number of alternatives.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.cases.len()
    }

    /// Returns the scoped enumerator for a case (`ns::Enum::VALUE`).
    #[must_use]
    pub fn scoped_enumerator(&self, case: &SelectorCase) -> String {
        format!("{}::{}", self.discriminant_enum, case.enumerator)
    }
}

/// Resolved semantic type of a data element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeReference {
    /// Primitive, carrying its C++ type name.
    Primitive(String),
    /// Sequence of the inner type.
    ArrayOf(Box<TypeReference>),
    /// Enumeration reference.
    EnumRef(QualifiedName),
    /// Data group (or template) reference.
    GroupRef(QualifiedName),
    /// Polymorphic alternation over data groups sharing a template.
    Alternation(Alternation),
}

impl TypeReference {
    /// Returns the C++ type used to declare a field of this type.
    #[must_use]
    pub fn cpp_type(&self) -> String {
        match self {
            Self::Primitive(name) => name.clone(),
            Self::ArrayOf(inner) => format!("std::vector<{}>", inner.cpp_type()),
            Self::EnumRef(q) | Self::GroupRef(q) => q.to_string(),
            Self::Alternation(alt) => format!("std::unique_ptr<{}>", alt.base_template),
        }
    }

    /// Returns true for alternations.
    #[must_use]
    pub const fn is_alternation(&self) -> bool {
        matches!(self, Self::Alternation(_))
    }

    /// Returns the element type of an array, or `self` for scalars.
    #[must_use]
    pub fn element_type(&self) -> &TypeReference {
        match self {
            Self::ArrayOf(inner) => inner.element_type(),
            other => other,
        }
    }

    /// Returns the schemas owning the named types this type mentions.
    #[must_use]
    pub fn schemas(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_schemas(&mut out);
        out
    }

    fn collect_schemas<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Primitive(_) => {}
            Self::ArrayOf(inner) => inner.collect_schemas(out),
            Self::EnumRef(q) | Self::GroupRef(q) => push_unique(out, &q.schema),
            Self::Alternation(alt) => {
                push_unique(out, &alt.base_template.schema);
                for case in &alt.cases {
                    push_unique(out, &case.concrete.schema);
                }
            }
        }
    }
}

fn push_unique<'a>(out: &mut Vec<&'a str>, schema: &'a str) {
    if !out.contains(&schema) {
        out.push(schema);
    }
}

/// Parsed selector constraint `discriminant(A, B, ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConstraint {
    /// Discriminant element name.
    pub discriminant: String,
    /// Enumerator names, in order.
    pub enumerators: Vec<String>,
}

static SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<key>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<values>.*)\)\s*$")
        .expect("selector pattern is valid")
});

impl SelectorConstraint {
    /// Parses a single constraint string, returning `None` if it is not a
    /// selector constraint.
    #[must_use]
    pub fn parse(constraint: &str) -> Option<Self> {
        let captures = SELECTOR.captures(constraint)?;
        let enumerators = captures["values"]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self {
            discriminant: captures["key"].to_string(),
            enumerators,
        })
    }
}

/// Resolves type strings of one schema against a [`TypeLookup`].
pub struct TypeResolver<'a, L: TypeLookup> {
    lookup: &'a L,
    schema: &'a str,
}

impl<'a, L: TypeLookup> TypeResolver<'a, L> {
    /// Creates a resolver for the named schema.
    #[must_use]
    pub fn new(lookup: &'a L, schema: &'a str) -> Self {
        Self { lookup, schema }
    }

    /// Resolves the type of a data element.
    ///
    /// `siblings` are all elements of the owning data group; they are needed
    /// to find the discriminant of an alternation.
    ///
    /// # Errors
    /// Returns `SchemaError::UnresolvedType` for unknown names and
    /// `SchemaError::Grammar` for malformed type strings or selectors.
    pub fn resolve_element(
        &self,
        field: &str,
        element: &DataElementDef,
        siblings: &IndexMap<String, DataElementDef>,
    ) -> Result<TypeReference, SchemaError> {
        let raw = element
            .data_type
            .as_deref()
            .ok_or_else(|| SchemaError::grammar(self.schema, field, "missing 'Data Type'"))?;
        let raw = raw.trim();

        if let Some(inner) = strip_delimiters(raw, '(', ')') {
            return self
                .resolve_alternation(field, inner, element, siblings)
                .map(TypeReference::Alternation);
        }
        self.resolve(field, raw)
    }

    /// Resolves a non-alternation type string.
    ///
    /// # Errors
    /// Returns `SchemaError` if the string is malformed or names an unknown type.
    pub fn resolve(&self, field: &str, raw: &str) -> Result<TypeReference, SchemaError> {
        let raw = raw.trim();
        if let Some(inner) = strip_delimiters(raw, '[', ']') {
            let inner = self.resolve(field, inner)?;
            if inner.is_alternation() {
                return Err(SchemaError::grammar(
                    self.schema,
                    field,
                    "arrays of alternations are not supported",
                ));
            }
            return Ok(TypeReference::ArrayOf(Box::new(inner)));
        }
        if strip_delimiters(raw, '(', ')').is_some() {
            return Err(SchemaError::grammar(
                self.schema,
                field,
                "alternations are only allowed at the top level of a type",
            ));
        }
        if let Some(name) = strip_delimiters(raw, '{', '}') {
            return self.resolve_named(field, raw, name.trim(), Expected::Group);
        }
        if let Some(name) = strip_delimiters(raw, '<', '>') {
            return self.resolve_named(field, raw, name.trim(), Expected::Enum);
        }
        if raw.is_empty() {
            return Err(SchemaError::grammar(self.schema, field, "empty 'Data Type'"));
        }
        self.resolve_named(field, raw, raw, Expected::Any)
    }

    fn resolve_named(
        &self,
        field: &str,
        raw: &str,
        name: &str,
        expected: Expected,
    ) -> Result<TypeReference, SchemaError> {
        match self.lookup.lookup(name) {
            Some(LookupEntry::Referenced(entry)) => {
                let qualified = QualifiedName::new(&entry.name, &entry.schema, &entry.namespace);
                match (&entry.kind, expected) {
                    (ReferencedKind::Enumeration { .. }, Expected::Enum | Expected::Any) => {
                        Ok(TypeReference::EnumRef(qualified))
                    }
                    (
                        ReferencedKind::DataGroup { .. } | ReferencedKind::Template,
                        Expected::Group | Expected::Any,
                    ) => Ok(TypeReference::GroupRef(qualified)),
                    (ReferencedKind::Enumeration { .. }, _) => Err(SchemaError::grammar(
                        self.schema,
                        field,
                        format!("'{name}' is an enumeration; write it as <{name}>"),
                    )),
                    (_, _) => Err(SchemaError::grammar(
                        self.schema,
                        field,
                        format!("'{name}' is a data group; write it as {{{name}}}"),
                    )),
                }
            }
            Some(LookupEntry::Primitive(cpp)) if expected == Expected::Any => {
                Ok(TypeReference::Primitive(cpp.to_string()))
            }
            Some(LookupEntry::Primitive(_)) => Err(SchemaError::grammar(
                self.schema,
                field,
                format!("'{name}' is a primitive type and cannot be written as '{raw}'"),
            )),
            None => Err(SchemaError::unresolved(self.schema, field, raw)),
        }
    }

    fn resolve_alternation(
        &self,
        field: &str,
        inner: &str,
        element: &DataElementDef,
        siblings: &IndexMap<String, DataElementDef>,
    ) -> Result<Alternation, SchemaError> {
        let mut selectors = element
            .constraints
            .iter()
            .filter_map(|c| SelectorConstraint::parse(c));
        let selector = selectors.next().ok_or_else(|| {
            SchemaError::grammar(
                self.schema,
                field,
                "alternation requires a 'discriminant(ENUM_A, ENUM_B, ...)' constraint",
            )
        })?;
        if selectors.next().is_some() {
            return Err(SchemaError::grammar(
                self.schema,
                field,
                "alternation names more than one discriminant",
            ));
        }

        let alternatives: Vec<TypeReference> = inner
            .split(',')
            .map(|t| self.resolve(field, t))
            .collect::<Result<_, _>>()?;
        if alternatives.len() != selector.enumerators.len() {
            return Err(SchemaError::grammar(
                self.schema,
                field,
                format!(
                    "alternation has {} types but selector '{}' lists {} enumerators",
                    alternatives.len(),
                    selector.discriminant,
                    selector.enumerators.len()
                ),
            ));
        }

        let discriminant_enum = self.resolve_discriminant(field, &selector, siblings)?;

        let mut concrete_types = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            match alternative {
                TypeReference::GroupRef(q) => concrete_types.push(q),
                other => {
                    return Err(SchemaError::grammar(
                        self.schema,
                        field,
                        format!(
                            "alternatives must be data groups, found '{}'",
                            other.cpp_type()
                        ),
                    ));
                }
            }
        }

        let first = &concrete_types[0];
        let template = self.lookup.template_of(&first.name).ok_or_else(|| {
            SchemaError::grammar(
                self.schema,
                field,
                format!("alternative '{}' does not derive from a Data Group Template", first.name),
            )
        })?;
        if let Some(other) = concrete_types
            .iter()
            .skip(1)
            .find(|q| self.lookup.template_of(&q.name) != Some(template))
        {
            return Err(SchemaError::grammar(
                self.schema,
                field,
                format!(
                    "alternative '{}' does not derive from '{template}' like '{}'",
                    other.name, first.name
                ),
            ));
        }
        let base_template = match self.lookup.lookup(template) {
            Some(LookupEntry::Referenced(entry)) => {
                QualifiedName::new(&entry.name, &entry.schema, &entry.namespace)
            }
            _ => QualifiedName::new(template, &first.schema, &first.namespace),
        };

        let cases = selector
            .enumerators
            .into_iter()
            .zip(concrete_types)
            .map(|(enumerator, concrete)| SelectorCase {
                enumerator,
                concrete,
            })
            .collect();

        Ok(Alternation {
            discriminant: selector.discriminant,
            discriminant_enum,
            cases,
            base_template,
        })
    }

    fn resolve_discriminant(
        &self,
        field: &str,
        selector: &SelectorConstraint,
        siblings: &IndexMap<String, DataElementDef>,
    ) -> Result<QualifiedName, SchemaError> {
        let discriminant = siblings.get(&selector.discriminant).ok_or_else(|| {
            SchemaError::grammar(
                self.schema,
                field,
                format!("discriminant '{}' is not an element of this group", selector.discriminant),
            )
        })?;
        let raw = discriminant.data_type.as_deref().ok_or_else(|| {
            SchemaError::grammar(self.schema, &selector.discriminant, "missing 'Data Type'")
        })?;

        let TypeReference::EnumRef(enum_name) = self.resolve(&selector.discriminant, raw)? else {
            return Err(SchemaError::grammar(
                self.schema,
                field,
                format!("discriminant '{}' is not an enumeration", selector.discriminant),
            ));
        };

        if let Some(LookupEntry::Referenced(entry)) = self.lookup.lookup(&enum_name.name) {
            if let ReferencedKind::Enumeration { enumerators } = &entry.kind {
                if enumerators.len() < selector.enumerators.len() {
                    return Err(SchemaError::grammar(
                        self.schema,
                        field,
                        format!(
                            "enumeration '{}' has {} enumerators, fewer than the {} alternatives",
                            enum_name.name,
                            enumerators.len(),
                            selector.enumerators.len()
                        ),
                    ));
                }
                if let Some(missing) = selector
                    .enumerators
                    .iter()
                    .find(|e| !enumerators.contains(*e))
                {
                    return Err(SchemaError::grammar(
                        self.schema,
                        field,
                        format!("'{missing}' is not an enumerator of '{}'", enum_name.name),
                    ));
                }
            }
        }

        Ok(enum_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    Any,
    Group,
    Enum,
}

fn strip_delimiters(s: &str, open: char, close: char) -> Option<&str> {
    s.strip_prefix(open)?.strip_suffix(close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;
    use crate::references::TypeTables;
    use crate::types::{DataGroupDef, ObjectDef, SchemaDocument};

    const SCHEMA: &str = r#"
SpeedControlType:
  Object Type: "Enumeration"
  Enumerators:
    DISCRETE:
    CONTINUOUS:
PerformanceMapTemplate:
  Object Type: "Data Group Template"
OtherTemplate:
  Object Type: "Data Group Template"
PerformanceMapContinuous:
  Object Type: "Data Group"
  Data Group Template: PerformanceMapTemplate
  Data Elements:
    grid_variables:
      Data Type: "[Numeric]"
PerformanceMapDiscrete:
  Object Type: "PerformanceMapTemplate"
  Data Elements:
    grid_variables:
      Data Type: "[Numeric]"
Performance:
  Object Type: "Data Group"
  Data Elements:
    operation_speed_control_type:
      Data Type: "<SpeedControlType>"
      Required: True
    performance_map:
      Data Type: "({PerformanceMapContinuous}, {PerformanceMapDiscrete})"
      Constraints: "operation_speed_control_type(CONTINUOUS, DISCRETE)"
      Required: True
"#;

    fn document() -> SchemaDocument {
        parse_schema(SCHEMA, "fan").expect("Failed to parse")
    }

    fn performance(doc: &SchemaDocument) -> &DataGroupDef {
        match doc.get("Performance") {
            Some(ObjectDef::DataGroup(g)) => g,
            _ => panic!("missing Performance"),
        }
    }

    #[test]
    fn test_resolve_primitive_and_array() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");

        assert_eq!(
            resolver.resolve("x", "Numeric").expect("resolve"),
            TypeReference::Primitive("double".to_string())
        );
        let array = resolver.resolve("efficiency", "[Numeric]").expect("resolve");
        assert_eq!(array.cpp_type(), "std::vector<double>");
        assert_eq!(array.element_type().cpp_type(), "double");
    }

    #[test]
    fn test_resolve_enum_and_group_references() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");

        let e = resolver.resolve("op", "<SpeedControlType>").expect("resolve");
        assert_eq!(e.cpp_type(), "fan_ns::SpeedControlType");
        let states = resolver.resolve("op", "[<SpeedControlType>]").expect("resolve");
        assert_eq!(states.cpp_type(), "std::vector<fan_ns::SpeedControlType>");
        let g = resolver.resolve("map", "{PerformanceMapContinuous}").expect("resolve");
        assert!(matches!(g, TypeReference::GroupRef(ref q) if q.name == "PerformanceMapContinuous"));
        assert_eq!(g.schemas(), ["fan"]);
    }

    #[test]
    fn test_unresolved_type_is_error() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");

        match resolver.resolve("speed", "[Velocity]") {
            Err(SchemaError::UnresolvedType {
                schema,
                field,
                raw_type,
            }) => {
                assert_eq!(schema, "fan");
                assert_eq!(field, "speed");
                assert_eq!(raw_type, "Velocity");
            }
            other => panic!("expected unresolved type, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_delimiters_are_grammar_errors() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");

        assert!(matches!(
            resolver.resolve("x", "{SpeedControlType}"),
            Err(SchemaError::Grammar { .. })
        ));
        assert!(matches!(
            resolver.resolve("x", "<Numeric>"),
            Err(SchemaError::Grammar { .. })
        ));
    }

    #[test]
    fn test_resolve_alternation() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");
        let group = performance(&doc);

        let resolved = resolver
            .resolve_element(
                "performance_map",
                &group.data_elements["performance_map"],
                &group.data_elements,
            )
            .expect("resolve");

        let TypeReference::Alternation(alt) = &resolved else {
            panic!("expected alternation");
        };
        assert_eq!(alt.arity(), 2);
        assert_eq!(alt.discriminant, "operation_speed_control_type");
        assert_eq!(alt.base_template.name, "PerformanceMapTemplate");
        assert_eq!(alt.cases[0].enumerator, "CONTINUOUS");
        assert_eq!(alt.cases[0].concrete.name, "PerformanceMapContinuous");
        assert_eq!(alt.cases[1].concrete.name, "PerformanceMapDiscrete");
        assert_eq!(
            alt.scoped_enumerator(&alt.cases[1]),
            "fan_ns::SpeedControlType::DISCRETE"
        );
        assert_eq!(
            resolved.cpp_type(),
            "std::unique_ptr<fan_ns::PerformanceMapTemplate>"
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let doc = document();
        let group = performance(&doc);
        let element = &group.data_elements["performance_map"];

        let first = {
            let tables = TypeTables::for_document(&doc, &[]);
            TypeResolver::new(&tables, "fan")
                .resolve_element("performance_map", element, &group.data_elements)
                .expect("resolve")
        };
        let second = {
            let tables = TypeTables::for_document(&doc, &[]);
            TypeResolver::new(&tables, "fan")
                .resolve_element("performance_map", element, &group.data_elements)
                .expect("resolve")
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_alternation_arity_mismatch() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");
        let group = performance(&doc);

        let mut element = group.data_elements["performance_map"].clone();
        element.constraints = vec!["operation_speed_control_type(CONTINUOUS)".to_string()];
        let result = resolver.resolve_element("performance_map", &element, &group.data_elements);
        assert!(matches!(result, Err(SchemaError::Grammar { .. })));
    }

    #[test]
    fn test_alternation_multiple_discriminants() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");
        let group = performance(&doc);

        let mut element = group.data_elements["performance_map"].clone();
        element.constraints.push("other_key(CONTINUOUS, DISCRETE)".to_string());
        let result = resolver.resolve_element("performance_map", &element, &group.data_elements);
        assert!(matches!(result, Err(SchemaError::Grammar { message, .. }) if message.contains("more than one")));
    }

    #[test]
    fn test_alternation_unknown_enumerator() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");
        let group = performance(&doc);

        let mut element = group.data_elements["performance_map"].clone();
        element.constraints = vec!["operation_speed_control_type(CONTINUOUS, STAGED)".to_string()];
        let result = resolver.resolve_element("performance_map", &element, &group.data_elements);
        assert!(matches!(result, Err(SchemaError::Grammar { message, .. }) if message.contains("STAGED")));
    }

    #[test]
    fn test_alternatives_must_share_template() {
        let doc = document();
        let tables = TypeTables::for_document(&doc, &[]);
        let resolver = TypeResolver::new(&tables, "fan");
        let group = performance(&doc);

        let mut element = group.data_elements["performance_map"].clone();
        element.data_type = Some("({PerformanceMapContinuous}, {Performance})".to_string());
        let result = resolver.resolve_element("performance_map", &element, &group.data_elements);
        assert!(matches!(result, Err(SchemaError::Grammar { message, .. }) if message.contains("does not derive")));
    }

    #[test]
    fn test_selector_constraint_parse() {
        let selector = SelectorConstraint::parse("operation_speed_control_type(CONTINUOUS, DISCRETE)")
            .expect("selector");
        assert_eq!(selector.discriminant, "operation_speed_control_type");
        assert_eq!(selector.enumerators, ["CONTINUOUS", "DISCRETE"]);
        assert!(SelectorConstraint::parse(">=0.0").is_none());
        assert!(SelectorConstraint::parse("[1..]").is_none());
    }

    #[test]
    fn test_selector_constraint_whitespace() {
        let selector = SelectorConstraint::parse("  stage_type ( A ,B, )  ").expect("selector");
        assert_eq!(selector.discriminant, "stage_type");
        assert_eq!(selector.enumerators, ["A", "B"]);
        assert!(SelectorConstraint::parse("2stage(A)").is_none());
    }
}
