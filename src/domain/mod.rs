//! Domain layer containing business entities and contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Redirect rules, targets, pages and sites
//! - [`repositories`] - Data access trait definitions
//! - [`change_item`] - Snapshot pair describing a pending slug rename
//! - [`site_finder`] - Lookup over the configured sites
//! - [`events`] - Pre/post persist hooks for auto-created redirects
//! - [`hit_event`] - Hit counting event model
//! - [`hit_worker`] - Asynchronous hit processing worker
//!
//! The domain layer does not depend on infrastructure or presentation; the
//! infrastructure layer implements its repository traits.
//!
//! # Hit Processing Flow
//!
//! 1. The redirect middleware answers a matched request
//! 2. A [`hit_event::HitEvent`] is offered to a bounded channel
//! 3. [`hit_worker::run_hit_worker`] applies it with retry logic
//! 4. The counter is updated via [`repositories::RedirectRepository::increment_hit`]

pub mod change_item;
pub mod entities;
pub mod events;
pub mod hit_event;
pub mod hit_worker;
pub mod repositories;
pub mod site_finder;
