//! Business Profile listing for authenticated (client tier) users.
//!
//! The access token is opaque. All failures degrade to empty lists.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use velocity_core::config::PlacesConfig;

use crate::client::PlacesError;

const LOCATION_READ_MASK: &str = "name,title,storeCode,metadata";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAccount {
    /// e.g. `accounts/123456`
    pub name: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default, rename = "type")]
    pub account_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLocation {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl ProfileLocation {
    /// Business id to select for this location: its place id, else its title.
    pub fn selection_id(&self) -> &str {
        self.place_id.as_deref().filter(|id| !id.is_empty()).unwrap_or(&self.title)
    }
}

#[derive(Debug, Default, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<ProfileAccount>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    locations: Vec<RawLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocation {
    name: String,
    #[serde(default)]
    title: String,
    store_code: Option<String>,
    metadata: Option<LocationMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationMetadata {
    place_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct BusinessProfileClient {
    client: Client,
    business_url: String,
    account_url: String,
}

impl BusinessProfileClient {
    pub fn new(
        client: Client,
        business_url: impl Into<String>,
        account_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            business_url: business_url.into().trim_end_matches('/').to_string(),
            account_url: account_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(client: Client, config: &PlacesConfig) -> Self {
        Self::new(client, &config.business_profile_url, &config.account_management_url)
    }

    pub async fn list_accounts(&self, access_token: &str) -> Vec<ProfileAccount> {
        let url = format!("{}/accounts", self.account_url);
        match self.get_json::<AccountsResponse>(&url, access_token).await {
            Ok(response) => response.accounts,
            Err(error) => {
                warn!(event_name = "profile.accounts.failed", error = %error, "listing accounts failed");
                Vec::new()
            }
        }
    }

    pub async fn list_locations(&self, access_token: &str, account: &str) -> Vec<ProfileLocation> {
        let url = format!(
            "{}/{}/locations?readMask={LOCATION_READ_MASK}",
            self.business_url,
            account.trim_matches('/')
        );
        match self.get_json::<LocationsResponse>(&url, access_token).await {
            Ok(response) => response
                .locations
                .into_iter()
                .map(|location| ProfileLocation {
                    name: location.name,
                    title: location.title,
                    store_code: location.store_code,
                    place_id: location.metadata.and_then(|metadata| metadata.place_id),
                })
                .collect(),
            Err(error) => {
                warn!(
                    event_name = "profile.locations.failed",
                    account,
                    error = %error,
                    "listing locations failed"
                );
                Vec::new()
            }
        }
    }

    /// Locations across every account, in account order.
    pub async fn list_all_locations(&self, access_token: &str) -> Vec<ProfileLocation> {
        let mut locations = Vec::new();
        for account in self.list_accounts(access_token).await {
            locations.extend(self.list_locations(access_token, &account.name).await);
        }
        info!(
            event_name = "profile.locations.listed",
            count = locations.len(),
            "listed business profile locations"
        );
        locations
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, PlacesError> {
        if access_token.trim().is_empty() {
            return Err(PlacesError::MissingCredentials);
        }
        let response = self.client.get(url).bearer_auth(access_token.trim()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlacesError::Status { status: status.as_u16(), body });
        }
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::ProfileLocation;

    #[test]
    fn selection_id_prefers_place_id() {
        let mut location = ProfileLocation {
            name: "accounts/1/locations/2".to_string(),
            title: "Snow Family Dentistry".to_string(),
            store_code: None,
            place_id: Some("ChIJUQvj6h-vK4cRVPaPZQIQOl0".to_string()),
        };
        assert_eq!(location.selection_id(), "ChIJUQvj6h-vK4cRVPaPZQIQOl0");

        location.place_id = None;
        assert_eq!(location.selection_id(), "Snow Family Dentistry");
    }
}
