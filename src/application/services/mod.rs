//! Business logic services for the application layer.

pub mod hit_tracker;
pub mod integrity_service;
pub mod page_router;
pub mod redirect_engine;
pub mod redirect_matcher;
pub mod redirect_service;
pub mod slug_analyzer;
pub mod slug_service;
pub mod target_resolver;

pub use hit_tracker::{HitRecord, HitTracker};
pub use integrity_service::{IntegrityReport, IntegrityService};
pub use page_router::{PagePlacement, PageRouter, ResolvedPage};
pub use redirect_engine::{RedirectEngine, ResolvedRedirect};
pub use redirect_matcher::{MatchKind, MatchedRedirect, RedirectMatcher};
pub use redirect_service::RedirectService;
pub use slug_analyzer::{LiveLocation, SlugChangeAnalyzer, SlugChangePlan};
pub use slug_service::{RenameOutcome, RenameResult, SlugService};
pub use target_resolver::{RequestContext, TargetResolver};
