use b2share_metadata_core::contract::{FlatRecord, MockRecordSource, MockSchemaProvider};
use b2share_metadata_core::error::MappingError;
use b2share_metadata_core::mapper::MapperOptions;
use b2share_metadata_core::pipeline::{load_fields, map_metadata, MappingRequest};
use b2share_metadata_core::records::DelimitedFile;
use b2share_metadata_core::schema::SchemaFile;
use serde_json::{json, Value};
use std::fs::write;
use tempfile::tempdir;

const COMMUNITY: &str = "e9b9792e-79fb-4b07-b6b4-b9c2bd06d095";

fn eudat_schema() -> Value {
    json!({
        "json_schema": {
            "allOf": [
                {
                    "$schema": "http://json-schema.org/draft-04/schema#",
                    "properties": {
                        "$schema": { "type": "string" },
                        "community": { "type": "string" },
                        "title": { "type": "string" },
                        "open_access": { "type": "boolean" },
                        "creators": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": { "name": { "type": "string" } }
                            }
                        },
                        "keywords": { "type": "array", "items": { "type": "string" } },
                        "license": {
                            "type": "object",
                            "properties": {
                                "license": { "type": "string" },
                                "license_uri": { "type": "string" }
                            }
                        }
                    }
                }
            ]
        }
    })
}

fn request() -> MappingRequest {
    MappingRequest {
        community_id: COMMUNITY.to_string(),
        options: MapperOptions::default(),
    }
}

fn provider_returning(schema: Value) -> MockSchemaProvider {
    let mut provider = MockSchemaProvider::new();
    provider
        .expect_fetch_schema()
        .times(1)
        .returning(move |community_id| {
            assert_eq!(community_id, COMMUNITY);
            Ok(schema.clone())
        });
    provider
}

fn source_returning(records: Vec<FlatRecord>) -> MockRecordSource {
    let mut source = MockRecordSource::new();
    source
        .expect_read_records()
        .times(1)
        .return_once(move || Ok(records));
    source
}

#[tokio::test]
async fn test_map_metadata_builds_demo_document() {
    let provider = provider_returning(eudat_schema());
    let source = source_returning(vec![
        FlatRecord::new(1, "title", "", "Demo"),
        FlatRecord::new(2, "open_access", "", "true"),
        FlatRecord::new(3, "creators", "name", "Alice"),
        FlatRecord::new(4, "creators", "name", "Bob"),
    ]);

    let outcome = map_metadata(&request(), &provider, &source)
        .await
        .expect("mapping run should succeed");

    assert_eq!(
        serde_json::to_value(&outcome.document).expect("document serialises"),
        json!({
            "title": "Demo",
            "open_access": true,
            "creators": [ { "name": "Alice" }, { "name": "Bob" } ]
        })
    );
    assert_eq!(outcome.records_applied, 4);
    assert_eq!(outcome.fields_declared, 6, "$schema is filtered out");
}

#[tokio::test]
async fn test_map_metadata_unknown_field_aborts_run() {
    let provider = provider_returning(eudat_schema());
    let source = source_returning(vec![
        FlatRecord::new(1, "title", "", "Demo"),
        FlatRecord::new(2, "domain", "", "generic"),
        FlatRecord::new(3, "keywords", "", "never applied"),
    ]);

    let err = map_metadata(&request(), &provider, &source)
        .await
        .expect_err("unknown field must fail the run");
    match err {
        MappingError::UnknownField { field, line, .. } => {
            assert_eq!(field, "domain");
            assert_eq!(line, 2);
        }
        other => panic!("expected UnknownField, got {other:?}"),
    }
}

#[tokio::test]
async fn test_map_metadata_provider_failure_is_schema_fetch_error() {
    let mut provider = MockSchemaProvider::new();
    provider
        .expect_fetch_schema()
        .times(1)
        .returning(|_| Err("connection refused".into()));
    let mut source = MockRecordSource::new();
    source.expect_read_records().never();

    let err = map_metadata(&request(), &provider, &source)
        .await
        .expect_err("provider failure must fail the run");
    assert!(
        matches!(err, MappingError::SchemaFetch(ref msg) if msg.contains("connection refused")),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_map_metadata_malformed_schema_is_schema_fetch_error() {
    let provider = provider_returning(json!({ "json_schema": { "allOf": [] } }));
    let mut source = MockRecordSource::new();
    source.expect_read_records().never();

    let err = map_metadata(&request(), &provider, &source)
        .await
        .unwrap_err();
    assert!(matches!(err, MappingError::SchemaFetch(_)), "got {err:?}");
}

#[tokio::test]
async fn test_map_metadata_passes_record_errors_through() {
    let provider = provider_returning(eudat_schema());
    let mut source = MockRecordSource::new();
    source.expect_read_records().times(1).returning(|| {
        Err(Box::new(MappingError::MalformedRecord {
            line: 7,
            content: "title;Demo".to_string(),
            parts: 2,
        }))
    });

    let err = map_metadata(&request(), &provider, &source)
        .await
        .unwrap_err();
    assert!(
        matches!(err, MappingError::MalformedRecord { line: 7, parts: 2, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_map_metadata_wraps_other_record_source_errors() {
    let provider = provider_returning(eudat_schema());
    let mut source = MockRecordSource::new();
    source
        .expect_read_records()
        .times(1)
        .returning(|| Err("disk on fire".into()));

    let err = map_metadata(&request(), &provider, &source)
        .await
        .unwrap_err();
    assert!(
        matches!(err, MappingError::RecordSource(ref msg) if msg.contains("disk on fire")),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_load_fields_lists_schema_fields() {
    let provider = provider_returning(eudat_schema());
    let fields = load_fields(&provider, COMMUNITY)
        .await
        .expect("fields should load");
    let listing: Vec<String> = fields
        .iter()
        .map(|(name, def)| format!("{name}: {def}"))
        .collect();
    assert_eq!(
        listing,
        vec![
            "community: string",
            "title: string",
            "open_access: boolean",
            "creators: array<object{name}>",
            "keywords: array<string>",
            "license: object{license, license_uri}",
        ]
    );
}

#[tokio::test]
async fn test_map_metadata_from_files_on_disk() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("schema.json");
    let records_path = dir.path().join("eudat-metadata.csv");
    write(&schema_path, serde_json::to_string(&eudat_schema()).unwrap()).unwrap();
    write(
        &records_path,
        "title;;Demo\nlicense;license_uri;https://creativecommons.org/licenses/by/4.0/\nlicense;license;CC-BY\nkeywords;;Demo\nkeywords;;Demo\n",
    )
    .unwrap();

    let provider = SchemaFile::new(&schema_path);
    let source = DelimitedFile::new(&records_path);
    let outcome = map_metadata(&request(), &provider, &source)
        .await
        .expect("file based run should succeed");

    assert_eq!(
        serde_json::to_value(&outcome.document).expect("document serialises"),
        json!({
            "title": "Demo",
            "license": {
                "license_uri": "https://creativecommons.org/licenses/by/4.0/",
                "license": "CC-BY"
            },
            "keywords": ["Demo", "Demo"]
        })
    );
}
