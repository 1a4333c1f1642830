//! Error type for a mapping run. Every variant is fatal to the run.

/// Errors raised while fetching the schema, reading records or applying them.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Schema provider failed, or the document lacks the expected shape.
    #[error("schema fetch failed: {0}")]
    SchemaFetch(String),

    /// A record names a field the schema does not declare.
    #[error("unknown field '{field}' under '{path}' (record at line {line})")]
    UnknownField {
        path: String,
        field: String,
        line: usize,
    },

    /// A source line did not split into key, subkey and value.
    #[error("malformed record at line {line}: expected 3 fields, found {parts}: {content:?}")]
    MalformedRecord {
        line: usize,
        content: String,
        parts: usize,
    },

    /// Definition without a usable `type` or `enum`. Strict mode only.
    #[error("unsupported definition for '{path}': {reason}")]
    UnsupportedKind { path: String, reason: String },

    /// A write target already holds a value of an incompatible shape.
    #[error("conflicting value at '{path}' (record at line {line}): expected {expected}")]
    Conflict {
        path: String,
        expected: &'static str,
        line: usize,
    },

    /// Record source could not be read.
    #[error("record source failed: {0}")]
    RecordSource(String),
}
