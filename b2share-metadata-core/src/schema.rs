//! Community schema model and field extraction.
//!
//! A B2SHARE community schema is a JSON Schema document. The mapper only cares
//! about the metadata block at `json_schema.allOf[0].properties` and, below it,
//! the `type`, `properties`, `items` and `enum` keys of every reachable field.
//! Those are parsed once into a [`FieldDefinition`] tree.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::contract::{CollaboratorError, SchemaProvider};
use crate::error::MappingError;

/// How a single schema field is encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefinition {
    String,
    Integer,
    Boolean,
    /// Enum-constrained field without a `type` tag. Membership is not checked.
    Enum,
    /// Nested object, keyed by sub-field name.
    Object(IndexMap<String, FieldDefinition>),
    /// Sequence whose elements follow the boxed definition.
    Array(Box<FieldDefinition>),
    /// Neither a recognised `type` nor an `enum`; the reason is kept for logs.
    Unsupported(String),
}

impl FieldDefinition {
    /// Parse one field definition, recursing into `properties` and `items`.
    ///
    /// A `type` tag wins over an `enum` constraint.
    pub fn from_json(definition: &Value) -> Self {
        let Some(obj) = definition.as_object() else {
            return FieldDefinition::Unsupported("definition is not a JSON object".into());
        };

        match obj.get("type") {
            Some(Value::String(tag)) => match tag.as_str() {
                "string" => FieldDefinition::String,
                "integer" => FieldDefinition::Integer,
                "boolean" => FieldDefinition::Boolean,
                "object" => {
                    let properties = obj
                        .get("properties")
                        .and_then(Value::as_object)
                        .map(|props| {
                            props
                                .iter()
                                .map(|(name, def)| (name.clone(), FieldDefinition::from_json(def)))
                                .collect()
                        })
                        .unwrap_or_default();
                    FieldDefinition::Object(properties)
                }
                "array" => {
                    let items = match obj.get("items") {
                        Some(items) => FieldDefinition::from_json(items),
                        None => FieldDefinition::Unsupported("array without 'items'".into()),
                    };
                    FieldDefinition::Array(Box::new(items))
                }
                other => FieldDefinition::Unsupported(format!("unsupported type '{other}'")),
            },
            Some(other) => FieldDefinition::Unsupported(format!("non-string type tag {other}")),
            None if obj.contains_key("enum") => FieldDefinition::Enum,
            None => FieldDefinition::Unsupported("neither 'type' nor 'enum' present".into()),
        }
    }

    /// Short kind name, as it appears in the schema.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldDefinition::String => "string",
            FieldDefinition::Integer => "integer",
            FieldDefinition::Boolean => "boolean",
            FieldDefinition::Enum => "enum",
            FieldDefinition::Object(_) => "object",
            FieldDefinition::Array(_) => "array",
            FieldDefinition::Unsupported(_) => "unsupported",
        }
    }
}

impl fmt::Display for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefinition::Array(items) => write!(f, "array<{items}>"),
            FieldDefinition::Object(props) => {
                write!(f, "object{{")?;
                for (i, name) in props.keys().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}")?;
                }
                write!(f, "}}")
            }
            other => f.write_str(other.kind()),
        }
    }
}

/// Top-level field table of a community schema, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaFields {
    fields: IndexMap<String, FieldDefinition>,
}

impl SchemaFields {
    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDefinition)> {
        self.fields.iter()
    }
}

impl FromIterator<(String, FieldDefinition)> for SchemaFields {
    fn from_iter<T: IntoIterator<Item = (String, FieldDefinition)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Extract the metadata field table from a raw community schema document.
///
/// Takes `json_schema.allOf[0].properties` and keeps only names starting with
/// an alphanumeric character, which drops `$schema`-style metadata keys.
pub fn extract_fields(document: &Value) -> Result<SchemaFields, MappingError> {
    let json_schema = document
        .get("json_schema")
        .ok_or_else(|| shape_error("missing 'json_schema'"))?;
    let all_of = json_schema
        .get("allOf")
        .and_then(Value::as_array)
        .ok_or_else(|| shape_error("missing 'json_schema.allOf' list"))?;
    let block = all_of
        .first()
        .ok_or_else(|| shape_error("'json_schema.allOf' is empty"))?;
    let properties = block
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| shape_error("missing 'json_schema.allOf[0].properties' object"))?;

    let fields: SchemaFields = properties
        .iter()
        .filter(|(name, _)| name.chars().next().is_some_and(char::is_alphanumeric))
        .map(|(name, def)| (name.clone(), FieldDefinition::from_json(def)))
        .collect();

    debug!(
        declared = properties.len(),
        kept = fields.len(),
        "Extracted metadata fields from schema"
    );
    Ok(fields)
}

fn shape_error(msg: &str) -> MappingError {
    error!(reason = msg, "Schema document does not have the expected shape");
    MappingError::SchemaFetch(msg.to_string())
}

/// Schema provider backed by a JSON file on disk.
///
/// The community identifier is only logged; the file is expected to hold the
/// schema of whichever community the caller asked for.
pub struct SchemaFile {
    path: PathBuf,
}

impl SchemaFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl SchemaProvider for SchemaFile {
    async fn fetch_schema(&self, community_id: &str) -> Result<Value, CollaboratorError> {
        info!(path = %self.path.display(), community_id, "Reading community schema from file");
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Failed to read schema file");
            format!("failed to read schema file {}: {e}", self.path.display())
        })?;
        let document = serde_json::from_str(&content).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Schema file is not valid JSON");
            format!("schema file {} is not valid JSON: {e}", self.path.display())
        })?;
        Ok(document)
    }
}
