//! Schema document loader.
//!
//! YAML syntax is handled by `serde_yaml`; this module maps the resulting
//! nested mappings onto the typed object model in [`crate::types`].

use crate::error::LoadError;
use crate::types::{
    DataElementDef, DataGroupDef, DataTypeDef, EnumerationDef, EnumeratorDef, MetaDef, ObjectDef,
    ObjectType, PrimitiveKind, Required, SchemaDocument, StringTypeDef, TemplateDef,
};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Parses a schema document from YAML text.
///
/// # Arguments
/// * `yaml` - YAML schema content
/// * `schema_name` - Name of the schema (normally the file stem)
///
/// # Errors
/// Returns `LoadError` if the YAML is malformed or an object record is invalid.
pub fn parse_schema(yaml: &str, schema_name: &str) -> Result<SchemaDocument, LoadError> {
    let value: Value = serde_yaml::from_str(yaml)?;
    parse_value(&value, schema_name)
}

/// Loads a schema document from a file.
///
/// The schema name is the file name up to its first `.`.
///
/// # Errors
/// Returns `LoadError` if the file cannot be read or parsed.
pub fn load_schema(path: &Path) -> Result<SchemaDocument, LoadError> {
    let yaml = std::fs::read_to_string(path)?;
    parse_schema(&yaml, &schema_name_from_path(path))
}

/// Returns the schema name for a file path (`fan.schema.yaml` -> `fan`).
#[must_use]
pub fn schema_name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .and_then(|n| n.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

/// Maps an already loaded YAML value onto a schema document.
///
/// # Errors
/// Returns `LoadError` if the value is not a mapping of object records.
pub fn parse_value(value: &Value, schema_name: &str) -> Result<SchemaDocument, LoadError> {
    let root = value.as_mapping().ok_or_else(|| LoadError::InvalidStructure {
        message: "top level of a schema must be a mapping of object names".to_string(),
    })?;

    let mut document = SchemaDocument::new(schema_name);

    for (key, record) in root {
        let name = key.as_str().ok_or_else(|| LoadError::InvalidStructure {
            message: format!("object name {key:?} is not a string"),
        })?;
        let record = record
            .as_mapping()
            .ok_or_else(|| LoadError::invalid(name, "Object Type", "a mapping"))?;
        let object = parse_object(name, record)?;
        document.add_object(name, object);
    }

    Ok(document)
}

/// Parses a single object record.
fn parse_object(name: &str, record: &Mapping) -> Result<ObjectDef, LoadError> {
    let object_type = get_str(name, record, "Object Type")?
        .ok_or_else(|| LoadError::missing_key(name, "Object Type"))?;

    let Some(kind) = ObjectType::parse(object_type) else {
        if object_type.trim().is_empty() {
            return Err(LoadError::UnknownObjectType {
                object: name.to_string(),
                object_type: object_type.to_string(),
            });
        }
        // Any other tag names the template the group derives from; whether
        // that template exists is checked against the lookup tables later.
        let mut group = parse_data_group(name, record)?;
        group.template.get_or_insert_with(|| object_type.to_string());
        return Ok(ObjectDef::DataGroup(group));
    };

    let object = match kind {
        ObjectType::Meta => ObjectDef::Meta(MetaDef {
            title: get_string(name, record, "Title")?,
            version: get_string(name, record, "Version")?,
            description: get_string(name, record, "Description")?,
            references: get_string_list(name, record, "References")?,
            root_data_group: get_string(name, record, "Root Data Group")?,
        }),
        ObjectType::DataType => {
            let json_type = get_str(name, record, "JSON Schema Type")?
                .ok_or_else(|| LoadError::missing_key(name, "JSON Schema Type"))?;
            let kind = PrimitiveKind::parse(json_type).ok_or_else(|| {
                LoadError::invalid(name, "JSON Schema Type", "integer, number, string or boolean")
            })?;
            ObjectDef::DataType(DataTypeDef {
                kind,
                description: get_string(name, record, "Description")?,
            })
        }
        ObjectType::StringType => ObjectDef::StringType(StringTypeDef {
            description: get_string(name, record, "Description")?,
            pattern: get_string(name, record, "Regular Expression Pattern")?,
        }),
        ObjectType::Enumeration => ObjectDef::Enumeration(parse_enumeration(name, record)?),
        ObjectType::DataGroup => ObjectDef::DataGroup(parse_data_group(name, record)?),
        ObjectType::DataGroupTemplate => ObjectDef::DataGroupTemplate(TemplateDef {
            description: get_string(name, record, "Description")?,
            data_elements: parse_data_elements(name, record)?,
        }),
    };

    Ok(object)
}

/// Parses the `Enumerators` section.
fn parse_enumeration(name: &str, record: &Mapping) -> Result<EnumerationDef, LoadError> {
    let enumerators = record
        .get("Enumerators")
        .ok_or_else(|| LoadError::missing_key(name, "Enumerators"))?
        .as_mapping()
        .ok_or_else(|| LoadError::invalid(name, "Enumerators", "a mapping"))?;

    let mut result = EnumerationDef::default();
    for (key, attributes) in enumerators {
        let enumerator = key
            .as_str()
            .ok_or_else(|| LoadError::invalid(name, "Enumerators", "string enumerator names"))?;
        let def = match attributes {
            Value::Null => EnumeratorDef::default(),
            Value::Mapping(m) => EnumeratorDef {
                description: get_string(enumerator, m, "Description")?,
                display_text: get_string(enumerator, m, "Display Text")?,
                notes: get_string_list(enumerator, m, "Notes")?,
            },
            _ => return Err(LoadError::invalid(enumerator, "Enumerators", "a mapping")),
        };
        result.enumerators.insert(enumerator.to_string(), def);
    }

    Ok(result)
}

fn parse_data_group(name: &str, record: &Mapping) -> Result<DataGroupDef, LoadError> {
    Ok(DataGroupDef {
        template: get_string(name, record, "Data Group Template")?,
        data_elements: parse_data_elements(name, record)?,
    })
}

/// Parses the `Data Elements` section; a missing section yields no elements.
fn parse_data_elements(
    name: &str,
    record: &Mapping,
) -> Result<IndexMap<String, DataElementDef>, LoadError> {
    let mut elements = IndexMap::new();
    let Some(section) = record.get("Data Elements") else {
        return Ok(elements);
    };
    let section = section
        .as_mapping()
        .ok_or_else(|| LoadError::invalid(name, "Data Elements", "a mapping"))?;

    for (key, attributes) in section {
        let element = key
            .as_str()
            .ok_or_else(|| LoadError::invalid(name, "Data Elements", "string element names"))?;
        let attributes = attributes
            .as_mapping()
            .ok_or_else(|| LoadError::invalid(element, "Data Elements", "a mapping"))?;
        elements.insert(element.to_string(), parse_data_element(element, attributes)?);
    }

    Ok(elements)
}

fn parse_data_element(name: &str, attributes: &Mapping) -> Result<DataElementDef, LoadError> {
    let data_type = match get_string(name, attributes, "Data Type")? {
        Some(t) => Some(t),
        None => get_string(name, attributes, "Type")?,
    };

    let required = match attributes.get("Required") {
        None | Some(Value::Null) => Required::Always(false),
        Some(Value::Bool(b)) => Required::Always(*b),
        Some(Value::String(expr)) => Required::Conditional(expr.clone()),
        Some(_) => {
            return Err(LoadError::invalid(
                name,
                "Required",
                "a boolean or a condition string",
            ));
        }
    };

    Ok(DataElementDef {
        data_type,
        constraints: get_string_list(name, attributes, "Constraints")?,
        required,
        units: get_string(name, attributes, "Units")?,
        description: get_string(name, attributes, "Description")?,
        notes: get_string_list(name, attributes, "Notes")?,
    })
}

fn get_str<'a>(object: &str, record: &'a Mapping, key: &str) -> Result<Option<&'a str>, LoadError> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(LoadError::invalid(object, key, "a string")),
    }
}

/// Reads a scalar as text; numbers and booleans are accepted (e.g. `Version: 1.0`).
fn get_string(object: &str, record: &Mapping, key: &str) -> Result<Option<String>, LoadError> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value)
            .map(Some)
            .ok_or_else(|| LoadError::invalid(object, key, "a scalar")),
    }
}

/// Reads either a single scalar or a sequence of scalars.
fn get_string_list(object: &str, record: &Mapping, key: &str) -> Result<Vec<String>, LoadError> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| {
                scalar_to_string(item)
                    .ok_or_else(|| LoadError::invalid(object, key, "a list of scalars"))
            })
            .collect(),
        Some(value) => scalar_to_string(value)
            .map(|s| vec![s])
            .ok_or_else(|| LoadError::invalid(object, key, "a scalar or a list of scalars")),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
