//! Background worker applying hit events to the redirect store.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::hit_event::HitEvent;
use crate::domain::repositories::RedirectRepository;

/// Attempts after the first failed write.
const MAX_RETRIES: usize = 3;

/// Consumes hit events until every sender is dropped.
///
/// Each event becomes one atomic `increment_hit` call, retried with jittered
/// exponential backoff. A write that still fails is logged and counted; it is
/// never reported back to the request that produced it.
pub async fn run_hit_worker(
    mut rx: mpsc::Receiver<HitEvent>,
    repository: Arc<dyn RedirectRepository>,
) {
    while let Some(event) = rx.recv().await {
        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_secs(1))
            .map(jitter)
            .take(MAX_RETRIES);

        let result = Retry::spawn(strategy, || {
            let repository = repository.clone();
            async move {
                repository
                    .increment_hit(event.redirect_id, event.hit_at)
                    .await
            }
        })
        .await;

        match result {
            Ok(()) => {
                counter!("redirect_hits_recorded_total").increment(1);
            }
            Err(e) => {
                counter!("redirect_hits_failed_total").increment(1);
                tracing::error!(
                    redirect_id = event.redirect_id,
                    error = %e,
                    "Failed to record redirect hit"
                );
            }
        }
    }

    tracing::debug!("Hit worker stopped");
}
