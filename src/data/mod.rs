//! Core data models for the national sites browser
//!
//! This module contains the record types produced by the retrieval pipeline
//! (regions, sites and nearby places), the sentinel strings substituted for
//! missing fields, and the clients that fetch and extract them.

pub mod auth;
pub mod parks;
pub mod vicinity;

pub use auth::Credentials;
pub use parks::{ParksClient, RegionListing, NPS_BASE_URL};
pub use vicinity::{VicinityClient, MAPQUEST_RADIUS_URL};

use thiserror::Error;

use crate::net::FetchError;

/// Substituted when a site has no designation
pub const NO_CATEGORY: &str = "no category";
/// Substituted when a site's city is missing
pub const NO_CITY: &str = "no city";
/// Substituted when a site's state is missing
pub const NO_STATE: &str = "no state";
/// Substituted when a site's postal code is missing
pub const NO_ZIPCODE: &str = "no zipcode";
/// Substituted when a site's telephone marker is blank
pub const NO_PHONE: &str = "no phone";
/// Substituted when a nearby place has no street address
pub const NO_ADDRESS: &str = "no address";

/// One national site, as extracted from its detail page
///
/// Every field is always a string; missing values are replaced with the
/// sentinel constants in this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Designation, e.g. "National Park"
    pub category: String,
    /// Site name, e.g. "Isle Royale"
    pub name: String,
    /// "City, ST"
    pub address: String,
    /// 5-digit or ZIP+4 postal code
    pub postal_code: String,
    /// Phone number as printed on the page
    pub phone: String,
}

impl Site {
    /// One-line summary, e.g. "Isle Royale (National Park): Houghton, MI 49931"
    pub fn info(&self) -> String {
        format!(
            "{} ({}): {} {}",
            self.name, self.category, self.address, self.postal_code
        )
    }

    /// Whether the postal code is a real value rather than the sentinel
    pub fn has_postal_code(&self) -> bool {
        self.postal_code != NO_ZIPCODE
    }
}

/// A point of interest near a site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyPlace {
    pub name: String,
    pub category: String,
    pub street: String,
    pub city: String,
}

impl NearbyPlace {
    /// One-line summary, e.g. "Cafe X (Restaurants): 1 Main St, Ann Arbor"
    pub fn info(&self) -> String {
        format!("{} ({}): {}, {}", self.name, self.category, self.street, self.city)
    }
}

/// Mapping from lower-cased region name to region listing URL
///
/// Iteration follows the order regions appeared in the source page. Inserting a
/// name that is already present replaces its URL in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionIndex {
    entries: Vec<(String, String)>,
}

impl RegionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region, lower-casing its name
    pub fn insert(&mut self, name: &str, url: String) {
        let key = name.trim().to_lowercase();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = url,
            None => self.entries.push((key, url)),
        }
    }

    /// Looks up a region case-insensitively
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, url)| url.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors raised while turning a fetched page into records
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The page itself could not be obtained
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A structural marker the extractor depends on is absent
    #[error("{url}: page has no {element}")]
    MissingElement { url: String, element: &'static str },

    /// A link target could not be resolved against the base origin
    #[error("Invalid link '{href}': {source}")]
    InvalidUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },

    /// A built-in CSS selector failed to parse
    #[error("Invalid selector '{0}'")]
    Selector(&'static str),
}

/// Errors raised by the nearby-places lookup
#[derive(Debug, Error)]
pub enum LookupError {
    /// The API could not be reached or its response could not be cached
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The site has no postal code to search around
    #[error("{0} has no postal code")]
    NoPostalCode(String),

    /// The response envelope has no result list
    #[error("Response for '{0}' has no searchResults")]
    MissingResults(String),

    /// A result entry lacks a required field
    #[error("Malformed search result: {0}")]
    Malformed(#[from] serde_json::Error),
}
