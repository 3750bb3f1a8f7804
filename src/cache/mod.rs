//! Cache module for storing fetched pages and API responses on disk
//!
//! This module provides the persistent `RequestCache`, which keeps every response
//! in a single JSON file keyed by request identity, and the `Fetcher`, which
//! consults that cache before going to the network. Entries never expire unless a
//! TTL `CachePolicy` is configured.

mod fetcher;
mod store;

pub use fetcher::Fetcher;
pub use store::{CacheEntry, CacheError, CachePolicy, CacheStore, CachedValue, EntryKind, RequestCache};
