//! HTTP transport used by the fetch pipeline
//!
//! Components never talk to `reqwest` directly; they go through the `Transport`
//! trait so tests can serve canned pages without a network.

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{CacheError, EntryKind};

/// Default bound on a single request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while obtaining content for a cache key
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// The cache holds a different kind of body under this key
    #[error("Cache entry for '{key}' is not {expected:?}")]
    UnexpectedKind { key: String, expected: EntryKind },

    /// The request signature could not be computed
    #[error("Failed to sign request")]
    Signing,

    /// The fetched value could not be persisted
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Performs live network calls for the fetcher
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// GET `url` with `query` parameters and decode the body as JSON
    ///
    /// `authorization`, when present, is sent verbatim as the Authorization header.
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        authorization: Option<&str>,
    ) -> Result<Value, FetchError>;
}

/// `Transport` backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("npsites/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.text().await?)
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        authorization: Option<&str>,
    ) -> Result<Value, FetchError> {
        let mut request = self.client.get(url).query(query);
        if let Some(header) = authorization {
            request = request.header(AUTHORIZATION, header);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport for unit tests

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves canned pages and JSON documents, counting every call
    #[derive(Debug, Default)]
    pub struct FakeTransport {
        pages: HashMap<String, String>,
        documents: HashMap<String, Value>,
        calls: AtomicUsize,
        pub last_query: Mutex<Vec<(String, String)>>,
        pub last_authorization: Mutex<Option<String>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        /// Registers a JSON answer for requests whose `origin` parameter is `origin`
        pub fn with_document(mut self, origin: &str, document: Value) -> Self {
            self.documents.insert(origin.to_string(), document);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            })
        }

        async fn get_json(
            &self,
            url: &str,
            query: &[(&str, String)],
            authorization: Option<&str>,
        ) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_query.lock() {
                *last = query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect();
            }
            if let Ok(mut last) = self.last_authorization.lock() {
                *last = authorization.map(str::to_string);
            }
            let origin = query
                .iter()
                .find(|(k, _)| *k == "origin")
                .map(|(_, v)| v.as_str())
                .unwrap_or_default();
            self.documents
                .get(origin)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: StatusCode::NOT_FOUND,
                })
        }
    }
}
