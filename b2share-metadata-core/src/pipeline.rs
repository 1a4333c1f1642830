//! High-level run: fetch schema → extract fields → read records → map.
//!
//! This module wires the two collaborators from [`crate::contract`] to the
//! pure [`crate::mapper`]. A run is atomic: the first failing step aborts it
//! and no partial document is returned.
//!
//! # Major Types
//! - [`MappingRequest`]: community identifier and mapper options for one run
//! - [`MappingOutcome`]: the finished document plus counts for reporting
//!
//! # Callable From
//! - The CLI crate, with a network schema client or a schema file
//! - Integration tests, with `mockall` mocks of both collaborators
//!
//! # Error Handling
//! Collaborator errors are wrapped into [`MappingError`]; errors that already
//! are a `MappingError` (e.g. a malformed record line) pass through unchanged.

use tracing::{error, info};

use crate::contract::{CollaboratorError, RecordSource, SchemaProvider};
use crate::document::Document;
use crate::error::MappingError;
use crate::mapper::{map_records, MapperOptions};
use crate::schema::{extract_fields, SchemaFields};

/// Parameters of a single mapping run.
#[derive(Debug, Clone)]
pub struct MappingRequest {
    pub community_id: String,
    pub options: MapperOptions,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct MappingOutcome {
    pub document: Document,
    pub fields_declared: usize,
    pub records_applied: usize,
}

/// Fetch the community schema and extract its metadata field table.
pub async fn load_fields<P>(provider: &P, community_id: &str) -> Result<SchemaFields, MappingError>
where
    P: SchemaProvider + ?Sized,
{
    info!(community_id, "[MAP][SCHEMA] Fetching community schema");
    let document = provider.fetch_schema(community_id).await.map_err(|e| {
        error!(error = %e, community_id, "[MAP][SCHEMA][ERROR] Schema provider failed");
        passthrough_or(e, MappingError::SchemaFetch)
    })?;

    let fields = extract_fields(&document)?;
    info!(
        community_id,
        fields = fields.len(),
        "[MAP][SCHEMA] Extracted metadata fields"
    );
    Ok(fields)
}

/// Run a full mapping against the given collaborators.
pub async fn map_metadata<P, R>(
    request: &MappingRequest,
    provider: &P,
    source: &R,
) -> Result<MappingOutcome, MappingError>
where
    P: SchemaProvider + ?Sized,
    R: RecordSource + ?Sized,
{
    info!(community_id = %request.community_id, strict = request.options.strict, "[MAP] Starting mapping run");

    let fields = load_fields(provider, &request.community_id).await?;

    let records = source.read_records().await.map_err(|e| {
        error!(error = %e, "[MAP][RECORDS][ERROR] Record source failed");
        passthrough_or(e, MappingError::RecordSource)
    })?;
    info!(records = records.len(), "[MAP][RECORDS] Read metadata records");

    let document = map_records(&fields, &records, request.options)?;

    let outcome = MappingOutcome {
        records_applied: records.len(),
        fields_declared: fields.len(),
        document,
    };
    info!(
        records_applied = outcome.records_applied,
        top_level_keys = outcome.document.root().len(),
        "[MAP] Mapping run complete"
    );
    Ok(outcome)
}

/// Keep a `MappingError` raised inside a collaborator, wrap anything else.
fn passthrough_or(e: CollaboratorError, wrap: fn(String) -> MappingError) -> MappingError {
    match e.downcast::<MappingError>() {
        Ok(inner) => *inner,
        Err(other) => wrap(other.to_string()),
    }
}
