///
/// This module implements the CLI interface for b2share-metadata: command parsing,
/// argument resolution against the config file, and user-visible output.
///
/// All mapping logic (schema model, record transform, run orchestration) lives in the
/// [`b2share-metadata-core`] crate. This module is strictly CLI glue.
///
/// ## Output
/// - `map` prints the mapped JSON document to stdout.
/// - `fields` prints one `name: kind` line per top-level schema field.
/// - Logs go to stderr (see `main.rs`), so stdout can be piped.
///
/// [`b2share-metadata-core`]: ../../b2share-metadata-core/
use crate::load_config::{default_config, load_config, CliConfig};
use crate::schema_client::B2ShareClient;
use anyhow::{bail, Context, Result};
use b2share_metadata_core::contract::SchemaProvider;
use b2share_metadata_core::mapper::MapperOptions;
use b2share_metadata_core::pipeline::{load_fields, map_metadata, MappingRequest};
use b2share_metadata_core::records::DelimitedFile;
use b2share_metadata_core::schema::SchemaFile;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI for b2share-metadata: map flat metadata records onto community schemas.
#[derive(Parser)]
#[clap(
    name = "b2share-metadata",
    version,
    about = "Map delimited key/subkey/value metadata onto a B2SHARE community schema"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Map a records file onto the community schema and print the JSON document
    Map {
        /// Path to the delimited records file (key;subkey;value per line)
        #[clap(long)]
        records: PathBuf,
        #[clap(flatten)]
        schema: SchemaArgs,
        /// Fail on schema fields without a supported type instead of skipping them
        #[clap(long)]
        strict: bool,
        /// Print compact JSON instead of pretty-printed
        #[clap(long)]
        compact: bool,
    },
    /// List the top-level metadata fields of the community schema
    Fields {
        #[clap(flatten)]
        schema: SchemaArgs,
    },
}

#[derive(Args)]
pub struct SchemaArgs {
    /// Path to the YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Community identifier (overrides config and B2SHARE_COMMUNITY)
    #[clap(long)]
    pub community: Option<String>,
    /// Read the schema document from a JSON file instead of querying B2SHARE
    #[clap(long)]
    pub schema_file: Option<PathBuf>,
}

/// Schema source and community resolved from flags, config and environment.
struct ResolvedSchema {
    provider: Box<dyn SchemaProvider>,
    community_id: String,
}

fn resolve(args: &SchemaArgs) -> Result<(CliConfig, ResolvedSchema)> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config(),
    };

    let schema_file = args.schema_file.clone().or_else(|| config.schema.file.clone());
    let community_id = args
        .community
        .clone()
        .or_else(|| config.schema.community_id.clone());

    let resolved = match (schema_file, community_id) {
        (Some(path), community_id) => {
            tracing::info!(schema_file = %path.display(), "Using schema file");
            ResolvedSchema {
                provider: Box::new(SchemaFile::new(path)),
                community_id: community_id.unwrap_or_else(|| "local".to_string()),
            }
        }
        (None, Some(community_id)) => ResolvedSchema {
            provider: Box::new(B2ShareClient::new(&config.schema.base_url)),
            community_id,
        },
        (None, None) => bail!(
            "No community identifier: pass --community, set schema.community_id in the config, or set B2SHARE_COMMUNITY"
        ),
    };
    Ok((config, resolved))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Map {
            records,
            schema,
            strict,
            compact,
        } => {
            let (config, resolved) = resolve(&schema)?;
            let request = MappingRequest {
                community_id: resolved.community_id,
                options: MapperOptions {
                    strict: strict || config.mapping.strict,
                },
            };
            let source = DelimitedFile::new(&records).with_delimiter(config.records.delimiter);
            tracing::info!(command = "map", records = %records.display(), "Starting mapping run");

            let outcome = match map_metadata(&request, resolved.provider.as_ref(), &source).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(command = "map", error = %e, "Mapping failed");
                    return Err(anyhow::Error::new(e).context("Mapping failed"));
                }
            };

            let rendered = if compact {
                serde_json::to_string(&outcome.document)
            } else {
                serde_json::to_string_pretty(&outcome.document)
            }
            .context("Failed to serialise mapped document")?;
            println!("{rendered}");
            tracing::info!(
                command = "map",
                records_applied = outcome.records_applied,
                "Mapping complete"
            );
            Ok(())
        }
        Commands::Fields { schema } => {
            let (_, resolved) = resolve(&schema)?;
            let fields = load_fields(resolved.provider.as_ref(), &resolved.community_id)
                .await
                .context("Failed to load schema fields")?;
            for (name, definition) in fields.iter() {
                println!("{name}: {definition}");
            }
            tracing::info!(command = "fields", count = fields.len(), "Listed schema fields");
            Ok(())
        }
    }
}
