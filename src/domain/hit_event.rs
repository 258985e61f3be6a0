//! Hit event model for asynchronous hit counting.

use chrono::{DateTime, Utc};

/// A redirect hit waiting to be applied to the store.
///
/// Sent from the redirect middleware to
/// [`crate::domain::hit_worker::run_hit_worker`] through a bounded channel, so
/// the redirect response never waits for the counter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitEvent {
    pub redirect_id: i64,
    pub hit_at: DateTime<Utc>,
}

impl HitEvent {
    pub fn new(redirect_id: i64, hit_at: DateTime<Utc>) -> Self {
        Self {
            redirect_id,
            hit_at,
        }
    }

    pub fn now(redirect_id: i64) -> Self {
        Self::new(redirect_id, Utc::now())
    }
}
