use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use velocity_core::config::{sanitize_credential, PlacesConfig};
use velocity_core::domain::business::BusinessRecord;
use velocity_core::identifier::{classify, QueryKind};
use velocity_core::ports::PlaceLookup;

use crate::wire::{PlaceDetails, SearchResponse, DETAILS_FIELD_MASK, SEARCH_FIELD_MASK};

pub const API_KEY_HEADER: &str = "X-Goog-Api-Key";
pub const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("places credentials are missing")]
    MissingCredentials,
    #[error("places request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("places provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Places provider adapter. Every failure surfaces as `None` through
/// [`PlaceLookup`]; the typed error is kept for logging.
#[derive(Clone, Debug)]
pub struct PlacesClient {
    client: Client,
    base_url: String,
}

impl PlacesClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn from_config(config: &PlacesConfig) -> Result<Self, PlacesError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_client(builder.build()?, config.base_url.clone()))
    }

    pub async fn search_text(&self, query: &str, api_key: &str) -> Result<Option<String>, PlacesError> {
        let request = self
            .client
            .post(format!("{}/places:searchText", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .header(FIELD_MASK_HEADER, SEARCH_FIELD_MASK)
            .json(&json!({ "textQuery": query }));

        let response: SearchResponse = send_json(request).await?;
        Ok(response.first_resource_name())
    }

    pub async fn place_details(
        &self,
        resource_name: &str,
        api_key: &str,
        now: DateTime<Utc>,
    ) -> Result<BusinessRecord, PlacesError> {
        let request = self
            .client
            .get(format!("{}/{}", self.base_url, resource_name.trim_start_matches('/')))
            .header(API_KEY_HEADER, api_key)
            .header(FIELD_MASK_HEADER, DETAILS_FIELD_MASK);

        let details: PlaceDetails = send_json(request).await?;
        Ok(details.into_record(resource_name, now))
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, PlacesError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PlacesError::Status { status: status.as_u16(), body });
    }
    Ok(response.json::<T>().await?)
}

fn api_key(credentials: Option<&str>) -> Result<String, PlacesError> {
    credentials.and_then(sanitize_credential).ok_or(PlacesError::MissingCredentials)
}

#[async_trait]
impl PlaceLookup for PlacesClient {
    async fn resolve_identifier(&self, query: &str, credentials: Option<&str>) -> Option<String> {
        let text = match classify(query) {
            QueryKind::Resolved(resource_name) => {
                debug!(resource_name = %resource_name, "query is already a place resource");
                return Some(resource_name);
            }
            QueryKind::FreeText(text) if text.is_empty() => return None,
            QueryKind::FreeText(text) => text,
        };

        let result = match api_key(credentials) {
            Ok(key) => self.search_text(&text, &key).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(Some(resource_name)) => Some(resource_name),
            Ok(None) => {
                debug!(query = %text, "place search returned no results");
                None
            }
            Err(error) => {
                warn!(event_name = "places.search.failed", error = %error, "place search failed");
                None
            }
        }
    }

    async fn fetch_details(
        &self,
        resource_name: &str,
        credentials: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<BusinessRecord> {
        let result = match api_key(credentials) {
            Ok(key) => self.place_details(resource_name, &key, now).await,
            Err(error) => Err(error),
        };
        result
            .map_err(|error| {
                warn!(
                    event_name = "places.details.failed",
                    resource_name,
                    error = %error,
                    "place details fetch failed"
                );
            })
            .ok()
    }
}
