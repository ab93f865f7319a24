use crate::models::CandidateFacility;
use crate::services::{http_client, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Source of every candidate facility
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the complete catalog, following pagination internally
    async fn fetch_all(&self) -> Result<Vec<CandidateFacility>, ProviderError>;
}

/// Airtable-backed facility catalog
///
/// Handles:
/// - Bearer token authentication
/// - Optional view selection
/// - `offset` cursor pagination
pub struct AirtableCatalog {
    base_url: String,
    api_token: String,
    base_id: String,
    table_name: String,
    view: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<serde_json::Value>,
    offset: Option<String>,
}

/// Upper bound on pages fetched in one call, guards against a looping cursor
const MAX_PAGES: usize = 1_000;

impl AirtableCatalog {
    pub fn new(
        base_url: String,
        api_token: String,
        base_id: String,
        table_name: String,
        view: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if api_token.is_empty() || base_id.is_empty() {
            return Err(ProviderError::MissingCredentials(
                "Airtable token and base id".into(),
            ));
        }

        Ok(Self {
            base_url,
            api_token,
            base_id,
            table_name,
            view,
            client: http_client(timeout)?,
        })
    }

    fn table_url(&self) -> String {
        format!(
            "{}/v0/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.base_id,
            urlencoding::encode(&self.table_name)
        )
    }
}

#[async_trait]
impl CatalogSource for AirtableCatalog {
    async fn fetch_all(&self) -> Result<Vec<CandidateFacility>, ProviderError> {
        let url = self.table_url();
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        for page in 0..MAX_PAGES {
            let mut params: Vec<(&str, &str)> = Vec::new();
            if let Some(view) = &self.view {
                params.push(("view", view.as_str()));
            }
            if let Some(cursor) = &offset {
                params.push(("offset", cursor.as_str()));
            }

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_token)
                .query(&params)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Catalog page {} failed: {} - {}", page, status, body);
                return Err(ProviderError::ApiError(format!(
                    "Failed to fetch catalog: {}",
                    status
                )));
            }

            let page_body: RecordPage = response.json().await?;
            tracing::debug!("Catalog page {}: {} records", page, page_body.records.len());
            records.extend(page_body.records.into_iter().filter_map(decode_record));

            match page_body.offset {
                Some(next) => offset = Some(next),
                None => return Ok(records),
            }
        }

        Err(ProviderError::InvalidResponse(format!(
            "Catalog pagination exceeded {} pages",
            MAX_PAGES
        )))
    }
}

/// One malformed record is skipped rather than failing its page
fn decode_record(record: serde_json::Value) -> Option<CandidateFacility> {
    let id = record
        .get("id")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("<no id>")
        .to_string();

    match serde_json::from_value(record) {
        Ok(facility) => Some(facility),
        Err(e) => {
            tracing::warn!("Skipping malformed catalog record {}: {}", id, e);
            None
        }
    }
}
