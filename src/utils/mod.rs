//! Utility functions for request handling.
//!
//! - [`extract_host`] - Host extraction from HTTP headers and URIs
//! - [`query_string`] - Query string parsing, comparison and merging

pub mod extract_host;
pub mod query_string;
