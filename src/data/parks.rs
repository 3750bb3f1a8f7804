//! National park service site directory client
//!
//! Fetches the landing page, state listing pages and site detail pages through
//! the request cache and extracts regions and `Site` records from their markup.

use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::{ExtractionError, RegionIndex, Site, NO_CATEGORY, NO_CITY, NO_PHONE, NO_STATE, NO_ZIPCODE};
use crate::cache::Fetcher;
use crate::net::Transport;

/// Origin of the site directory
pub const NPS_BASE_URL: &str = "https://www.nps.gov";

/// Appended to a listing link to reach the detail page
const SITE_PAGE_SUFFIX: &str = "index.htm";

/// Navigation menu listing every state
const REGION_NAV: &str = ".dropdown-menu.SearchBar-keywordSearch";
/// One row of a state listing
const LISTING_ROW: &str = "div.col-md-9.col-sm-9.col-xs-12.table-cell.list_left";
const TITLE_CONTAINER: &str = ".Hero-titleContainer";
const DESIGNATION_CONTAINER: &str = ".Hero-designationContainer";
const FOOTER: &str = "#ParkFooter";
const ADDRESS_LOCALITY: &str = r#"[itemprop="addressLocality"]"#;
const ADDRESS_REGION: &str = r#"[itemprop="addressRegion"]"#;
const POSTAL_CODE: &str = r#"[itemprop="postalCode"]"#;
const TELEPHONE: &str = r#"span[itemprop="telephone"]"#;

/// Sites extracted from one state listing
///
/// Sites keep the listing order. Detail pages that failed to extract are kept
/// in `failures` with their URL instead of aborting the whole listing.
#[derive(Debug, Default)]
pub struct RegionListing {
    pub sites: Vec<Site>,
    pub failures: Vec<(String, ExtractionError)>,
}

/// Client for the site directory
#[derive(Clone)]
pub struct ParksClient {
    fetcher: Arc<Fetcher>,
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl ParksClient {
    /// Creates a client that resolves links against `base_url`
    pub fn new(fetcher: Arc<Fetcher>, transport: Arc<dyn Transport>, base_url: Url) -> Self {
        Self {
            fetcher,
            transport,
            base_url,
        }
    }

    /// Builds the state name -> listing URL index from the landing page
    pub async fn build_region_index(&self) -> Result<RegionIndex, ExtractionError> {
        let url = self.base_url.as_str();
        let html = self.fetcher.fetch_html(url, self.transport.as_ref()).await?;
        parse_region_index(&html, url, &self.base_url)
    }

    /// Lists detail page URLs for every site on a state listing page, in page order
    pub async fn list_site_urls(&self, region_url: &str) -> Result<Vec<String>, ExtractionError> {
        let html = self
            .fetcher
            .fetch_html(region_url, self.transport.as_ref())
            .await?;
        parse_site_urls(&html, region_url, &self.base_url)
    }

    /// Fetches one detail page and extracts its `Site`
    pub async fn extract_site(&self, site_url: &str) -> Result<Site, ExtractionError> {
        let html = self
            .fetcher
            .fetch_html(site_url, self.transport.as_ref())
            .await?;
        parse_site(&html, site_url)
    }

    /// Extracts every site on a state listing page
    ///
    /// # Returns
    /// * `Ok(RegionListing)` - Extracted sites plus per-site failures
    /// * `Err(ExtractionError)` - The listing page itself could not be used
    pub async fn sites_for_region(&self, region_url: &str) -> Result<RegionListing, ExtractionError> {
        let urls = self.list_site_urls(region_url).await?;
        let mut listing = RegionListing::default();

        for url in urls {
            match self.extract_site(&url).await {
                Ok(site) => listing.sites.push(site),
                Err(err) => {
                    warn!(url = %url, error = %err, "skipping site");
                    listing.failures.push((url, err));
                }
            }
        }

        debug!(
            region_url,
            sites = listing.sites.len(),
            failures = listing.failures.len(),
            "region listing extracted"
        );
        Ok(listing)
    }
}

/// Parses a built-in selector
fn css(selector: &'static str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|_| ExtractionError::Selector(selector))
}

/// Concatenated, trimmed text of an element
fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first descendant matching `selector`, if non-blank
fn first_text(element: &ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|found| element_text(&found))
        .filter(|text| !text.is_empty())
}

fn missing(url: &str, element: &'static str) -> ExtractionError {
    ExtractionError::MissingElement {
        url: url.to_string(),
        element,
    }
}

fn resolve(base: &Url, href: &str) -> Result<Url, ExtractionError> {
    base.join(href).map_err(|source| ExtractionError::InvalidUrl {
        href: href.to_string(),
        source,
    })
}

/// Extracts the region index from landing page markup
pub fn parse_region_index(
    html: &str,
    page_url: &str,
    base: &Url,
) -> Result<RegionIndex, ExtractionError> {
    let document = Html::parse_document(html);
    let nav = document
        .select(&css(REGION_NAV)?)
        .next()
        .ok_or_else(|| missing(page_url, "state navigation menu"))?;

    let mut index = RegionIndex::new();
    for link in nav.select(&css("a")?) {
        let name = element_text(&link);
        let Some(href) = link.value().attr("href") else {
            warn!(region = %name, "state link has no href");
            continue;
        };
        index.insert(&name, resolve(base, href)?.to_string());
    }

    Ok(index)
}

/// Extracts detail page URLs from a state listing, in listing order
pub fn parse_site_urls(
    html: &str,
    page_url: &str,
    base: &Url,
) -> Result<Vec<String>, ExtractionError> {
    let document = Html::parse_document(html);
    let row_selector = css(LISTING_ROW)?;
    let link_selector = css("a")?;

    let mut urls = Vec::new();
    for row in document.select(&row_selector) {
        let href = row
            .select(&link_selector)
            .next()
            .and_then(|link| link.value().attr("href"));
        match href {
            Some(href) => urls.push(format!("{}{}", resolve(base, href)?, SITE_PAGE_SUFFIX)),
            None => warn!(page_url, "listing row has no link"),
        }
    }

    Ok(urls)
}

/// Extracts a `Site` from detail page markup
///
/// Each field is read independently. Name and telephone markers are required;
/// every other field falls back to its sentinel. Address components take the
/// last matching marker among the footer's spans.
pub fn parse_site(html: &str, page_url: &str) -> Result<Site, ExtractionError> {
    let document = Html::parse_document(html);
    let anchor = css("a")?;
    let span = css("span")?;

    let name = document
        .select(&css(TITLE_CONTAINER)?)
        .next()
        .and_then(|container| container.select(&anchor).next())
        .map(|link| element_text(&link))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| missing(page_url, "site name"))?;

    // An empty designation is kept as-is; only a missing one gets the sentinel.
    let category = document
        .select(&css(DESIGNATION_CONTAINER)?)
        .next()
        .and_then(|container| container.select(&span).next())
        .map(|marker| element_text(&marker))
        .unwrap_or_else(|| NO_CATEGORY.to_string());

    let footer = document.select(&css(FOOTER)?).next();

    let locality_selector = css(ADDRESS_LOCALITY)?;
    let region_selector = css(ADDRESS_REGION)?;
    let postal_selector = css(POSTAL_CODE)?;
    let mut locality = None;
    let mut region = None;
    let mut postal_code = None;
    if let Some(footer) = footer {
        for candidate in footer.select(&span) {
            if let Some(text) = first_text(&candidate, &locality_selector) {
                locality = Some(text);
            }
            if let Some(text) = first_text(&candidate, &region_selector) {
                region = Some(text);
            }
            if let Some(text) = first_text(&candidate, &postal_selector) {
                postal_code = Some(text);
            }
        }
    }

    let telephone_selector = css(TELEPHONE)?;
    let phone = footer
        .and_then(|footer| footer.select(&telephone_selector).next())
        .map(|marker| element_text(&marker))
        .ok_or_else(|| missing(page_url, "telephone"))?;

    Ok(Site {
        category,
        name,
        address: format!(
            "{}, {}",
            locality.as_deref().unwrap_or(NO_CITY),
            region.as_deref().unwrap_or(NO_STATE)
        ),
        postal_code: postal_code.unwrap_or_else(|| NO_ZIPCODE.to_string()),
        phone: if phone.is_empty() {
            NO_PHONE.to_string()
        } else {
            phone
        },
    })
}
