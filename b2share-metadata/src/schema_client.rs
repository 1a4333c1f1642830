#![doc = "B2SHARE schema client: implements the core SchemaProvider trait over the B2SHARE REST API."]
//
//! # Schema Client (CLI <-> Core)
//!
//! Bridges [`b2share_metadata_core::contract::SchemaProvider`] to a live
//! B2SHARE instance. The community schema is public, so no access token is
//! sent.
//!
//! - Construct [`B2ShareClient`] with a base URL (see `schema.base_url` in the config).
//! - `fetch_schema` issues `GET {base}/api/communities/{id}/schemas/last`.

use async_trait::async_trait;
use b2share_metadata_core::contract::{CollaboratorError, SchemaProvider};
use serde_json::Value;

pub const DEFAULT_B2SHARE_URL: &str = "https://trng-b2share.eudat.eu/";

pub struct B2ShareClient {
    http: reqwest::Client,
    base_url: String,
}

impl B2ShareClient {
    pub fn new(base_url: &str) -> Self {
        tracing::info!(base_url, "Initialized B2ShareClient");
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the latest schema of a community.
    pub fn schema_url(&self, community_id: &str) -> String {
        format!(
            "{}/api/communities/{}/schemas/last",
            self.base_url, community_id
        )
    }
}

#[async_trait]
impl SchemaProvider for B2ShareClient {
    async fn fetch_schema(&self, community_id: &str) -> Result<Value, CollaboratorError> {
        let url = self.schema_url(community_id);
        tracing::info!(url = %url, community_id, "Fetching community schema from B2SHARE");

        let response = self.http.get(&url).send().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to reach B2SHARE");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, url = %url, "B2SHARE returned error. Response body: {body}");
            return Err(format!("B2SHARE returned {status} for {url}").into());
        }

        match response.json::<Value>().await {
            Ok(document) => {
                tracing::info!(url = %url, "Received community schema");
                Ok(document)
            }
            Err(e) => {
                tracing::error!(error = ?e, url = %url, "B2SHARE schema response is not valid JSON");
                Err(format!("invalid JSON in schema response from {url}: {e}").into())
            }
        }
    }
}
