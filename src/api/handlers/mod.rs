//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod fallback;
pub mod health;
pub mod pages;
pub mod redirects;

pub use fallback::fallback_handler;
pub use health::health_handler;
pub use pages::rename_page_handler;
pub use redirects::{redirect_detail_handler, redirect_list_handler};
