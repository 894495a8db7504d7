use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::fetch::Transport;
use crate::settings::EngineSettings;
use crate::stats::RequestCounters;
use crate::types::PageIndex;

/// Bounds of the uniform jitter added to every backoff delay, in seconds.
const JITTER_RANGE_SECS: (f64, f64) = (0.1, 0.3);

/// Fetches listing pages with bounded exponential-backoff retry.
///
/// A page whose retries are exhausted is skipped for the run, never fatal.
/// The fetcher owns the request counting discipline: cancellation checks
/// happen before an attempt is counted.
pub struct RetryingFetcher {
    transport: Arc<dyn Transport>,
    settings: EngineSettings,
    counters: Arc<RequestCounters>,
    cancel: CancellationToken,
}

impl RetryingFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        settings: EngineSettings,
        counters: Arc<RequestCounters>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            settings,
            counters,
            cancel,
        }
    }

    /// Fetches one listing page, retrying up to the configured maximum.
    /// Returns `None` when the page is permanently skipped (retries
    /// exhausted or cancellation observed).
    pub async fn fetch_page(&self, page: PageIndex) -> Option<String> {
        let url = self.settings.listing_url(page);

        for attempt in 0..=self.settings.max_retries {
            if self.cancel.is_cancelled() {
                return None;
            }

            self.counters.record_attempt();
            match self.transport.fetch(&url).await {
                Ok(body) => {
                    self.counters.record_success();
                    return Some(body);
                }
                Err(err) => {
                    self.counters.record_failure();

                    if attempt < self.settings.max_retries && !self.cancel.is_cancelled() {
                        self.counters.record_retry();
                        let delay = backoff_delay(self.settings.base_delay, attempt);
                        log::warn!(
                            "page {page} request failed: {err} | retrying in {:.2}s ({}/{})",
                            delay.as_secs_f64(),
                            attempt + 1,
                            self.settings.max_retries,
                        );

                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = self.cancel.cancelled() => return None,
                        }
                    } else {
                        log::warn!("page {page} request failed, skipping: {err}");
                        return None;
                    }
                }
            }
        }

        None
    }
}

/// `base * 2^attempt` plus uniform jitter, so parallel retries against the
/// same host do not land in lockstep.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(JITTER_RANGE_SECS.0..JITTER_RANGE_SECS.1);
    base.mul_f64(f64::from(2u32.saturating_pow(attempt))) + Duration::from_secs_f64(jitter)
}
