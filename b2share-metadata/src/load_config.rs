/// `load_config` module: loads the static YAML config and applies environment overrides.
///
/// This is the only place where user-supplied YAML is parsed into typed structs.
///
/// # Responsibilities
/// - Parse the YAML configuration into [`CliConfig`], with every section optional
/// - Apply `B2SHARE_URL` / `B2SHARE_COMMUNITY` environment overrides
/// - Produce clear diagnostics for unreadable or invalid files
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::schema_client::DEFAULT_B2SHARE_URL;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub schema: SchemaSection,
    pub records: RecordsSection,
    pub mapping: MappingSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaSection {
    pub base_url: String,
    pub community_id: Option<String>,
    /// Read the schema document from this file instead of the B2SHARE API.
    pub file: Option<PathBuf>,
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_B2SHARE_URL.to_string(),
            community_id: None,
            file: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordsSection {
    pub delimiter: char,
}

impl Default for RecordsSection {
    fn default() -> Self {
        Self {
            delimiter: b2share_metadata_core::records::DEFAULT_DELIMITER,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingSection {
    pub strict: bool,
}

impl CliConfig {
    /// Override file values with `B2SHARE_URL` and `B2SHARE_COMMUNITY` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("B2SHARE_URL") {
            info!(base_url = %url, "B2SHARE_URL found in env, overriding schema.base_url");
            self.schema.base_url = url;
        }
        if let Ok(community) = std::env::var("B2SHARE_COMMUNITY") {
            info!(community_id = %community, "B2SHARE_COMMUNITY found in env, overriding schema.community_id");
            self.schema.community_id = Some(community);
        }
    }
}

/// Loads a YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Built-in defaults plus environment overrides, for runs without a config file.
pub fn default_config() -> CliConfig {
    let mut config = CliConfig::default();
    config.apply_env_overrides();
    config
}
