//! HTTP middleware for request processing.
//!
//! Provides the redirect layer and observability middleware.

pub mod redirect;
pub mod tracing;
