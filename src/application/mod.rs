//! Application layer services implementing the redirect logic.
//!
//! Services consume the repository traits of the domain layer and are shared
//! by the HTTP layer through [`crate::state::AppState`].
//!
//! # Available Services
//!
//! - [`services::redirect_engine::RedirectEngine`] - Request matching and target resolution
//! - [`services::slug_service::SlugService`] - Page renames with automatic redirects
//! - [`services::hit_tracker::HitTracker`] - Best-effort hit counting
//! - [`services::integrity_service::IntegrityService`] - Target integrity status
//! - [`services::redirect_service::RedirectService`] - Administrative listing

pub mod services;
