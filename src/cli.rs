//! Command-line interface parsing for the national sites browser
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the `StartupConfig` the application is built from: cache location and
//! policy, request timeout, log file and an optional pre-selected state.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::cache::{CachePolicy, RequestCache};
use crate::data::{Credentials, MAPQUEST_RADIUS_URL, NPS_BASE_URL};
use crate::net::DEFAULT_TIMEOUT;

/// File name of the log file when `--log-file` is not given
const LOG_FILE_NAME: &str = "npsites.log";

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// No cache file was given and no per-user cache directory exists
    #[error("Cannot determine a cache directory; pass --cache-file")]
    NoCacheDirectory,

    /// The TTL does not fit in a duration
    #[error("Invalid cache TTL: {0} hours is out of range")]
    InvalidTtl(u64),

    /// A zero timeout would fail every request
    #[error("Invalid timeout: must be at least 1 second")]
    ZeroTimeout,
}

/// National sites browser - find park sites by state and places nearby
#[derive(Parser, Debug)]
#[command(name = "npsites")]
#[command(about = "Browse national park sites by state and find places nearby")]
#[command(version)]
pub struct Cli {
    /// Open directly on a state's site list
    ///
    /// Examples:
    ///   npsites --state michigan
    ///   npsites --state "New York"
    #[arg(long, value_name = "STATE")]
    pub state: Option<String>,

    /// Cache file to use instead of the per-user cache directory
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Re-fetch cached responses older than this many hours (default: never)
    #[arg(long, value_name = "HOURS")]
    pub cache_ttl_hours: Option<u64>,

    /// Delete the cache file before starting
    #[arg(long)]
    pub clear_cache: bool,

    /// Give up on a request after this many seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Write logs here (default: next to the cache file)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Origin of the site directory
    #[arg(long, value_name = "URL", default_value = NPS_BASE_URL, hide = true)]
    pub base_url: Url,

    /// Radius search endpoint
    #[arg(long, value_name = "URL", default_value = MAPQUEST_RADIUS_URL, hide = true)]
    pub vicinity_url: String,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// State to open on start, if any
    pub initial_state: Option<String>,
    /// Location of the request cache file
    pub cache_path: PathBuf,
    /// When cached responses are re-fetched
    pub cache_policy: CachePolicy,
    /// Whether to delete the cache before starting
    pub clear_cache: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Location of the log file
    pub log_path: PathBuf,
    /// Origin of the site directory
    pub base_url: Url,
    /// Radius search endpoint
    pub vicinity_url: String,
    /// API credentials; nearby lookups are disabled without them
    pub credentials: Option<Credentials>,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// Credentials are not read here; attach them with `with_credentials`.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with defaults filled in
    /// * `Err(CliError)` if the timeout is zero, the TTL is out of range or no
    ///   cache location can be found
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.timeout_secs == 0 {
            return Err(CliError::ZeroTimeout);
        }

        let cache_path = match &cli.cache_file {
            Some(path) => path.clone(),
            None => RequestCache::new()
                .ok_or(CliError::NoCacheDirectory)?
                .path()
                .to_path_buf(),
        };
        let log_path = cli
            .log_file
            .clone()
            .unwrap_or_else(|| cache_path.with_file_name(LOG_FILE_NAME));

        let cache_policy = CachePolicy::from_ttl_hours(cli.cache_ttl_hours)
            .ok_or(CliError::InvalidTtl(cli.cache_ttl_hours.unwrap_or_default()))?;

        Ok(StartupConfig {
            initial_state: cli
                .state
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            cache_path,
            cache_policy,
            clear_cache: cli.clear_cache,
            timeout: Duration::from_secs(cli.timeout_secs),
            log_path,
            base_url: cli.base_url.clone(),
            vicinity_url: cli.vicinity_url.clone(),
            credentials: None,
        })
    }

    /// Attaches API credentials
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}
