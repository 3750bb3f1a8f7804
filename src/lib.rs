//! npsites library
//!
//! The request cache, site directory extraction and vicinity lookups, plus the
//! terminal UI built on top of them. Exposed as a library for integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod net;
pub mod ui;
