//! Best-effort hit counting for answered redirects.

use metrics::counter;
use tokio::sync::mpsc;

use crate::domain::entities::Redirect;
use crate::domain::hit_event::HitEvent;

/// What happened to a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRecord {
    /// Hit counting is switched off globally.
    FeatureDisabled,
    /// The rule opted out of hit counting.
    OptedOut,
    Queued,
    /// The queue was full or closed; the hit is lost.
    Dropped,
}

/// Hands hits to the background worker without waiting for the store.
#[derive(Clone)]
pub struct HitTracker {
    enabled: bool,
    tx: mpsc::Sender<HitEvent>,
}

impl HitTracker {
    pub fn new(enabled: bool, tx: mpsc::Sender<HitEvent>) -> Self {
        Self { enabled, tx }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Remaining queue slots, for health reporting.
    pub fn queue_capacity(&self) -> usize {
        self.tx.capacity()
    }

    pub fn queue_max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// True once the worker has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Records a hit on `redirect`. Never blocks and never fails.
    pub fn record_hit(&self, redirect: &Redirect) -> HitRecord {
        if !self.enabled {
            return HitRecord::FeatureDisabled;
        }
        if redirect.disable_hitcount {
            return HitRecord::OptedOut;
        }

        match self.tx.try_send(HitEvent::now(redirect.id)) {
            Ok(()) => HitRecord::Queued,
            Err(e) => {
                counter!("redirect_hits_dropped_total").increment(1);
                tracing::warn!(redirect_id = redirect.id, error = %e, "Hit queue unavailable, hit dropped");
                HitRecord::Dropped
            }
        }
    }
}
