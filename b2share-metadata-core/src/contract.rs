//! # contract: collaborator interfaces for a mapping run
//!
//! The mapper itself is pure. Everything it needs from the outside world comes
//! through the two traits defined here:
//!
//! - [`SchemaProvider`]: returns the raw, JSON-Schema-shaped community schema
//!   document for a community identifier (e.g. the B2SHARE REST API, or a file).
//! - [`RecordSource`]: returns the ordered flat `(key, subkey, value)` records.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, so tests can script schema and
//!   record responses without touching the network or disk.
//!
//! ## Error Convention
//! - Implementations return boxed trait-object errors. The run wraps them into
//!   [`crate::error::MappingError`] with the step that failed.

use async_trait::async_trait;

use mockall::automock;

/// Error type returned by collaborator implementations.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// One `(key, subkey, value)` triple read from the record source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRecord {
    /// 1-based line number in the source, for error reports.
    pub line: usize,
    /// Top-level schema field name.
    pub key: String,
    /// Sub-field name; empty when the field is not object-shaped.
    pub subkey: String,
    /// Raw textual value.
    pub value: String,
}

impl FlatRecord {
    pub fn new(line: usize, key: &str, subkey: &str, value: &str) -> Self {
        Self {
            line,
            key: key.to_string(),
            subkey: subkey.to_string(),
            value: value.to_string(),
        }
    }
}

/// Source of community schema documents.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Fetch the latest schema document for the given community.
    ///
    /// The returned value is the full document; field extraction happens in
    /// [`crate::schema::extract_fields`].
    async fn fetch_schema(
        &self,
        community_id: &str,
    ) -> Result<serde_json::Value, CollaboratorError>;
}

/// Source of flat metadata records, in input order.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Read every record. Order is significant for array grouping.
    async fn read_records(&self) -> Result<Vec<FlatRecord>, CollaboratorError>;
}
