//! Schema object model.
//!
//! This module contains the data structures representing one loaded DSL
//! document: meta information, primitive and string types, enumerations,
//! data groups and data group templates.

use indexmap::IndexMap;

/// One loaded schema document.
///
/// Object order is significant: it is the order in which declarations are
/// emitted before dependency ordering is applied.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Schema name (file stem, e.g. `fan` for `fan.schema.yaml`).
    pub name: String,
    /// Objects keyed by name, in document order.
    pub objects: IndexMap<String, ObjectDef>,
}

impl SchemaDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: IndexMap::new(),
        }
    }

    /// Adds an object to the document, replacing any object of the same name.
    pub fn add_object(&mut self, name: impl Into<String>, object: ObjectDef) {
        self.objects.insert(name.into(), object);
    }

    /// Looks up an object by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ObjectDef> {
        self.objects.get(name)
    }

    /// Returns the first Meta object, if any.
    #[must_use]
    pub fn meta(&self) -> Option<(&str, &MetaDef)> {
        self.objects.iter().find_map(|(name, obj)| match obj {
            ObjectDef::Meta(meta) => Some((name.as_str(), meta)),
            _ => None,
        })
    }

    /// Returns the names of schemas this document references.
    #[must_use]
    pub fn references(&self) -> &[String] {
        self.meta().map(|(_, m)| m.references.as_slice()).unwrap_or(&[])
    }

    /// Iterates over the objects of the given type, in document order.
    pub fn objects_of_type(&self, object_type: ObjectType) -> impl Iterator<Item = (&str, &ObjectDef)> {
        self.objects
            .iter()
            .filter(move |(_, obj)| obj.object_type() == object_type)
            .map(|(name, obj)| (name.as_str(), obj))
    }

    /// Iterates over all enumerations.
    pub fn enumerations(&self) -> impl Iterator<Item = (&str, &EnumerationDef)> {
        self.objects.iter().filter_map(|(name, obj)| match obj {
            ObjectDef::Enumeration(e) => Some((name.as_str(), e)),
            _ => None,
        })
    }

    /// Iterates over all data groups (including template-derived ones).
    pub fn data_groups(&self) -> impl Iterator<Item = (&str, &DataGroupDef)> {
        self.objects.iter().filter_map(|(name, obj)| match obj {
            ObjectDef::DataGroup(g) => Some((name.as_str(), g)),
            _ => None,
        })
    }

    /// Iterates over all data group templates.
    pub fn templates(&self) -> impl Iterator<Item = (&str, &TemplateDef)> {
        self.objects.iter().filter_map(|(name, obj)| match obj {
            ObjectDef::DataGroupTemplate(t) => Some((name.as_str(), t)),
            _ => None,
        })
    }

    /// Returns true if the document declares a template with the given name.
    #[must_use]
    pub fn declares_template(&self, name: &str) -> bool {
        matches!(self.objects.get(name), Some(ObjectDef::DataGroupTemplate(_)))
    }
}

/// Object type tag, as written under `Object Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Schema meta information.
    Meta,
    /// Primitive data type.
    DataType,
    /// String type (emitted as a typedef).
    StringType,
    /// Enumeration.
    Enumeration,
    /// Data group (record type).
    DataGroup,
    /// Data group template (abstract base contract).
    DataGroupTemplate,
}

impl ObjectType {
    /// Parses a built-in object type tag.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Meta" => Some(Self::Meta),
            "Data Type" => Some(Self::DataType),
            "String Type" => Some(Self::StringType),
            "Enumeration" => Some(Self::Enumeration),
            "Data Group" => Some(Self::DataGroup),
            "Data Group Template" => Some(Self::DataGroupTemplate),
            _ => None,
        }
    }

    /// Returns the DSL tag for this object type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "Meta",
            Self::DataType => "Data Type",
            Self::StringType => "String Type",
            Self::Enumeration => "Enumeration",
            Self::DataGroup => "Data Group",
            Self::DataGroupTemplate => "Data Group Template",
        }
    }
}

/// Object definition variants.
#[derive(Debug, Clone)]
pub enum ObjectDef {
    /// Meta information.
    Meta(MetaDef),
    /// Primitive data type.
    DataType(DataTypeDef),
    /// String type.
    StringType(StringTypeDef),
    /// Enumeration.
    Enumeration(EnumerationDef),
    /// Data group.
    DataGroup(DataGroupDef),
    /// Data group template.
    DataGroupTemplate(TemplateDef),
}

impl ObjectDef {
    /// Returns the object type tag.
    #[must_use]
    pub const fn object_type(&self) -> ObjectType {
        match self {
            Self::Meta(_) => ObjectType::Meta,
            Self::DataType(_) => ObjectType::DataType,
            Self::StringType(_) => ObjectType::StringType,
            Self::Enumeration(_) => ObjectType::Enumeration,
            Self::DataGroup(_) => ObjectType::DataGroup,
            Self::DataGroupTemplate(_) => ObjectType::DataGroupTemplate,
        }
    }
}

/// Schema meta information.
#[derive(Debug, Clone, Default)]
pub struct MetaDef {
    /// Human-readable title.
    pub title: Option<String>,
    /// Schema version string.
    pub version: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Names of referenced schemas.
    pub references: Vec<String>,
    /// Root data group name.
    pub root_data_group: Option<String>,
}

/// JSON Schema primitive kinds a Data Type maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `string`
    String,
    /// `boolean`
    Boolean,
}

impl PrimitiveKind {
    /// Parses a JSON Schema type name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Returns the C++ type used for this primitive.
    #[must_use]
    pub const fn cpp_type(&self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Number => "double",
            Self::String => "std::string",
            Self::Boolean => "bool",
        }
    }
}

/// Primitive data type definition.
#[derive(Debug, Clone)]
pub struct DataTypeDef {
    /// Underlying JSON Schema kind.
    pub kind: PrimitiveKind,
    /// Description.
    pub description: Option<String>,
}

/// String type definition.
#[derive(Debug, Clone, Default)]
pub struct StringTypeDef {
    /// Description.
    pub description: Option<String>,
    /// Validation pattern.
    pub pattern: Option<String>,
}

/// Enumeration definition.
#[derive(Debug, Clone, Default)]
pub struct EnumerationDef {
    /// Enumerators in declaration order.
    pub enumerators: IndexMap<String, EnumeratorDef>,
}

impl EnumerationDef {
    /// Returns true if an enumerator with the given name exists.
    #[must_use]
    pub fn has_enumerator(&self, name: &str) -> bool {
        self.enumerators.contains_key(name)
    }
}

/// A single enumerator.
#[derive(Debug, Clone, Default)]
pub struct EnumeratorDef {
    /// Description.
    pub description: Option<String>,
    /// Display text.
    pub display_text: Option<String>,
    /// Notes.
    pub notes: Vec<String>,
}

/// Data group definition.
#[derive(Debug, Clone, Default)]
pub struct DataGroupDef {
    /// Template this group derives from, if any.
    pub template: Option<String>,
    /// Data elements in declaration order.
    pub data_elements: IndexMap<String, DataElementDef>,
}

/// Data group template definition.
#[derive(Debug, Clone, Default)]
pub struct TemplateDef {
    /// Description.
    pub description: Option<String>,
    /// Data elements a derived group is expected to carry.
    pub data_elements: IndexMap<String, DataElementDef>,
}

/// Data element definition within a data group.
#[derive(Debug, Clone, Default)]
pub struct DataElementDef {
    /// Raw type string (`Data Type`).
    pub data_type: Option<String>,
    /// Raw constraint strings.
    pub constraints: Vec<String>,
    /// Requiredness.
    pub required: Required,
    /// Units.
    pub units: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Notes.
    pub notes: Vec<String>,
}

/// Requiredness of a data element.
///
/// Conditional expressions are stored verbatim and never evaluated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Required {
    /// Statically required (`true`) or optional (`false`).
    Always(bool),
    /// Conditional requirement expression.
    Conditional(String),
}

impl Required {
    /// Returns true only for statically required elements.
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Always(true))
    }
}

impl Default for Required {
    fn default() -> Self {
        Self::Always(false)
    }
}
