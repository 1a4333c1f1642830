//! Schema-driven record transform.
//!
//! [`SchemaMapper`] folds flat `(key, subkey, value)` records into a nested
//! [`Document`] shaped after the community schema. Records are applied one at
//! a time in input order; the order matters for arrays of objects, where a
//! repeated subkey marks the start of the next element.
//!
//! Encoding rules per definition kind:
//!
//! | kind               | effect                                                     |
//! |--------------------|------------------------------------------------------------|
//! | string, integer    | `out[key] = value`, verbatim text, no parsing               |
//! | enum               | `out[key] = value`, no membership check                    |
//! | boolean            | `out[key] = (value == "true")`, lossy and case-sensitive   |
//! | object             | descend into `out[key]` (or `out` itself if key == subkey) |
//! | array of objects   | write into the current element, or start a new one         |
//! | array of others    | append the raw value, duplicates kept                      |
//! | unsupported        | nothing written (error in strict mode)                     |

use std::collections::{HashMap, HashSet};
use tracing::{debug, error, warn};

use crate::contract::FlatRecord;
use crate::document::{Document, Mapping, Node};
use crate::error::MappingError;
use crate::schema::{FieldDefinition, SchemaFields};

/// Knobs for a mapping run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperOptions {
    /// Fail on definitions with neither a usable `type` nor an `enum`
    /// instead of skipping them.
    pub strict: bool,
}

/// Grouping state of one array-of-objects field.
///
/// Tracks which subkeys have been written into the element currently being
/// built. Seeing one of them again closes that element.
#[derive(Debug, Default)]
struct ArrayCursor {
    filled: HashSet<String>,
}

impl ArrayCursor {
    fn starts_new_element(&self, subkey: &str) -> bool {
        self.filled.contains(subkey)
    }

    fn open_element(&mut self) {
        self.filled.clear();
    }

    fn mark_filled(&mut self, subkey: &str) {
        self.filled.insert(subkey.to_string());
    }
}

/// Builds one [`Document`] from records, against a fixed field table.
pub struct SchemaMapper<'a> {
    fields: &'a SchemaFields,
    options: MapperOptions,
    document: Document,
    cursors: HashMap<String, ArrayCursor>,
    applied: usize,
}

impl<'a> SchemaMapper<'a> {
    pub fn new(fields: &'a SchemaFields, options: MapperOptions) -> Self {
        Self {
            fields,
            options,
            document: Document::new(),
            cursors: HashMap::new(),
            applied: 0,
        }
    }

    /// Apply one record to the document under construction.
    pub fn apply(&mut self, record: &FlatRecord) -> Result<(), MappingError> {
        let fields = self.fields;
        let definition = fields.get(&record.key).ok_or_else(|| {
            error!(key = %record.key, line = record.line, "Record names a field missing from the schema");
            MappingError::UnknownField {
                path: "(top level)".to_string(),
                field: record.key.clone(),
                line: record.line,
            }
        })?;

        let mut step = Step {
            record,
            options: self.options,
            cursors: &mut self.cursors,
        };
        let written = step.apply(
            self.document.root_mut(),
            definition,
            "",
            &record.key,
            &record.subkey,
        )?;

        debug!(
            line = record.line,
            key = %record.key,
            subkey = %record.subkey,
            kind = definition.kind(),
            written,
            "Applied record"
        );
        self.applied += 1;
        Ok(())
    }

    /// Number of records applied so far.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Hand over the finished document.
    pub fn finish(self) -> Document {
        self.document
    }
}

/// Map a full record set. All or nothing: the first error discards the
/// partially built document.
pub fn map_records(
    fields: &SchemaFields,
    records: &[FlatRecord],
    options: MapperOptions,
) -> Result<Document, MappingError> {
    let mut mapper = SchemaMapper::new(fields, options);
    for record in records {
        if let Err(e) = mapper.apply(record) {
            error!(error = %e, line = record.line, "[MAP][ERROR] Mapping aborted");
            return Err(e);
        }
    }
    Ok(mapper.finish())
}

/// State threaded through the recursive walk for a single record.
struct Step<'r> {
    record: &'r FlatRecord,
    options: MapperOptions,
    cursors: &'r mut HashMap<String, ArrayCursor>,
}

impl Step<'_> {
    /// Write the record's value into `output` under `key`. Returns whether
    /// anything was written.
    fn apply(
        &mut self,
        output: &mut Mapping,
        definition: &FieldDefinition,
        path: &str,
        key: &str,
        subkey: &str,
    ) -> Result<bool, MappingError> {
        let value = &self.record.value;
        match definition {
            FieldDefinition::String | FieldDefinition::Integer | FieldDefinition::Enum => {
                output.insert(key.to_string(), Node::Text(value.clone()));
                Ok(true)
            }
            FieldDefinition::Boolean => {
                output.insert(key.to_string(), Node::Bool(value == "true"));
                Ok(true)
            }
            FieldDefinition::Object(properties) => {
                self.apply_object(output, properties, path, key, subkey)
            }
            FieldDefinition::Array(items) => self.apply_array(output, items, path, key, subkey),
            FieldDefinition::Unsupported(reason) => self.unsupported(&join(path, key), reason),
        }
    }

    fn apply_object(
        &mut self,
        output: &mut Mapping,
        properties: &indexmap::IndexMap<String, FieldDefinition>,
        path: &str,
        key: &str,
        subkey: &str,
    ) -> Result<bool, MappingError> {
        let field_path = join(path, key);
        // Inline and array-element calls look the subkey up in the object at `path`.
        let owner = if key == subkey && !path.is_empty() {
            path
        } else {
            field_path.as_str()
        };
        let sub_definition = properties
            .get(subkey)
            .ok_or_else(|| MappingError::UnknownField {
                path: owner.to_string(),
                field: subkey.to_string(),
                line: self.record.line,
            })?;

        // A field named after its own sub-field writes in place, no wrapper.
        let inline = match output.get(key) {
            Some(Node::Mapping(_)) => false,
            Some(_) if key == subkey => true,
            Some(_) => return Err(self.conflict(field_path, "a mapping")),
            None => key == subkey,
        };

        if inline {
            return self.apply(output, sub_definition, path, subkey, subkey);
        }

        let node = output
            .entry(key.to_string())
            .or_insert_with(|| Node::Mapping(Mapping::new()));
        let Node::Mapping(target) = node else {
            return Err(self.conflict(field_path, "a mapping"));
        };
        self.apply(target, sub_definition, &field_path, subkey, subkey)
    }

    fn apply_array(
        &mut self,
        output: &mut Mapping,
        items: &FieldDefinition,
        path: &str,
        key: &str,
        subkey: &str,
    ) -> Result<bool, MappingError> {
        let field_path = join(path, key);
        let node = output
            .entry(key.to_string())
            .or_insert_with(|| Node::Sequence(Vec::new()));
        let Node::Sequence(elements) = node else {
            return Err(self.conflict(field_path, "a sequence"));
        };

        if !matches!(items, FieldDefinition::Object(_)) {
            if let FieldDefinition::Unsupported(reason) = items {
                if self.options.strict {
                    return self.unsupported(&format!("{field_path}[]"), reason);
                }
            }
            elements.push(Node::Text(self.record.value.clone()));
            return Ok(true);
        }

        let cursor = self.cursors.entry(field_path.clone()).or_default();
        if elements.is_empty() || cursor.starts_new_element(subkey) {
            elements.push(Node::Mapping(Mapping::new()));
            cursor.open_element();
        }

        let index = elements.len() - 1;
        let Some(Node::Mapping(element)) = elements.last_mut() else {
            return Err(self.conflict(format!("{field_path}[{index}]"), "a mapping"));
        };
        let element_path = format!("{field_path}[{index}]");
        let written = self.apply(element, items, &element_path, subkey, subkey)?;

        if written {
            self.cursors
                .entry(field_path)
                .or_default()
                .mark_filled(subkey);
        }
        Ok(written)
    }

    fn unsupported(&self, path: &str, reason: &str) -> Result<bool, MappingError> {
        if self.options.strict {
            return Err(MappingError::UnsupportedKind {
                path: path.to_string(),
                reason: reason.to_string(),
            });
        }
        warn!(
            path,
            reason,
            line = self.record.line,
            "Skipping value for field without a supported definition"
        );
        Ok(false)
    }

    fn conflict(&self, path: String, expected: &'static str) -> MappingError {
        warn!(path = %path, expected, line = self.record.line, "Write target holds an incompatible value");
        MappingError::Conflict {
            path,
            expected,
            line: self.record.line,
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
