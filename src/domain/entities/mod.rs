//! Core domain entities.
//!
//! Plain data structures describing redirect rules, their targets, the page
//! tree and the site topology the page tree is published under.
//!
//! # Entity Types
//!
//! - [`Redirect`] - A stored redirect rule
//! - [`RedirectTarget`] - Decoded target of a rule (external, relative, internal)
//! - [`PageRecord`] - One language version of a page
//! - [`Site`] - A routable page tree root with its languages
//!
//! Creation input lives in separate structs ([`NewRedirect`]) and partial
//! updates in patch structs ([`RedirectPatch`]).

pub mod page;
pub mod redirect;
pub mod site;
pub mod target;

pub use page::{FrontendUser, PageRecord, PageType, normalize_slug};
pub use redirect::{ANY_HOST, CreationType, IntegrityStatus, NewRedirect, Redirect, RedirectPatch};
pub use site::{Site, SiteBase, SiteLanguage, SiteRedirectSettings};
pub use target::{InternalTarget, RedirectTarget, TargetParseError};
