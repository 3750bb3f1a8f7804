//! MapQuest radius search client
//!
//! Looks up points of interest around a site's postal code. Responses are cached
//! as decoded JSON under the postal code, so two sites sharing a postal code
//! share one API call.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::{Credentials, LookupError, NearbyPlace, Site, NO_ADDRESS, NO_CATEGORY, NO_CITY};
use crate::cache::Fetcher;
use crate::net::Transport;

/// Radius search endpoint
pub const MAPQUEST_RADIUS_URL: &str = "http://www.mapquestapi.com/search/v2/radius";

/// Search radius around the origin, in miles
const SEARCH_RADIUS: u32 = 10;

/// Maximum number of places returned per lookup
const MAX_MATCHES: u32 = 10;

/// A single entry of the `searchResults` list
#[derive(Debug, Deserialize)]
struct SearchResult {
    name: String,
    fields: ResultFields,
}

#[derive(Debug, Deserialize)]
struct ResultFields {
    group_sic_code_name_ext: String,
    address: String,
    city: String,
}

/// Places near a site together with the envelope they were read from
#[derive(Debug, Clone, PartialEq)]
pub struct VicinityResults {
    pub places: Vec<NearbyPlace>,
    pub envelope: Value,
}

/// Client for the radius search API
#[derive(Clone)]
pub struct VicinityClient {
    fetcher: Arc<Fetcher>,
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    endpoint: String,
}

impl VicinityClient {
    /// Creates a client for the public MapQuest endpoint
    pub fn new(fetcher: Arc<Fetcher>, transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            fetcher,
            transport,
            credentials,
            endpoint: MAPQUEST_RADIUS_URL.to_string(),
        }
    }

    /// Overrides the endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Cache key for a lookup; only the postal code identifies the request
    fn cache_key(site: &Site) -> &str {
        &site.postal_code
    }

    fn query(&self, postal_code: &str) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.credentials.api_key.clone()),
            ("origin", postal_code.to_string()),
            ("radius", SEARCH_RADIUS.to_string()),
            ("maxMatches", MAX_MATCHES.to_string()),
            ("ambiguities", "ignore".to_string()),
            ("outFormat", "json".to_string()),
        ]
    }

    /// Finds places near `site`
    ///
    /// # Returns
    /// * `Ok(VicinityResults)` - Extracted places and the (possibly cached) envelope
    /// * `Err(LookupError)` - No postal code, request failure, or malformed envelope
    pub async fn find_nearby(&self, site: &Site) -> Result<VicinityResults, LookupError> {
        if !site.has_postal_code() {
            return Err(LookupError::NoPostalCode(site.name.clone()));
        }

        let key = Self::cache_key(site);
        let query = self.query(&site.postal_code);
        let envelope = self
            .fetcher
            .fetch_json(key, || async move {
                let authorization = self
                    .credentials
                    .authorization_header("GET", &self.endpoint, &query)?;
                self.transport
                    .get_json(&self.endpoint, &query, Some(authorization.as_str()))
                    .await
            })
            .await?;

        let places = parse_nearby(&envelope, key)?;
        debug!(site = %site.name, places = places.len(), "nearby places found");
        Ok(VicinityResults { places, envelope })
    }
}

/// Substitutes `sentinel` for an empty string
fn or_sentinel(value: String, sentinel: &str) -> String {
    if value.is_empty() {
        sentinel.to_string()
    } else {
        value
    }
}

/// Extracts nearby places from a radius search envelope
///
/// `key` only labels the error when the envelope has no result list.
pub fn parse_nearby(envelope: &Value, key: &str) -> Result<Vec<NearbyPlace>, LookupError> {
    let results = envelope
        .get("searchResults")
        .ok_or_else(|| LookupError::MissingResults(key.to_string()))?;
    let results: Vec<SearchResult> = serde_json::from_value(results.clone())?;

    Ok(results
        .into_iter()
        .map(|result| NearbyPlace {
            name: result.name,
            category: or_sentinel(result.fields.group_sic_code_name_ext, NO_CATEGORY),
            street: or_sentinel(result.fields.address, NO_ADDRESS),
            city: or_sentinel(result.fields.city, NO_CITY),
        })
        .collect())
}
