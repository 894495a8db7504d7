use std::time::Duration;

use crate::types::PageIndex;

/// Lowest and highest accepted worker counts.
pub const WORKER_RANGE: (usize, usize) = (1, 20);

/// Placeholder substituted with the page index in the listing URL template.
const PAGE_PLACEHOLDER: &str = "{page}";

/// Immutable run parameters, supplied at engine construction.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// User-Agent header value for every outbound request.
    pub user_agent: String,
    /// Requested worker count; read back clamped via [`Self::worker_count`].
    pub concurrency: usize,
    /// Per-request timeout. There is no whole-run timeout.
    pub request_timeout: Duration,
    /// Maximum retries per page after the initial attempt.
    pub max_retries: u32,
    /// Base delay of the exponential retry backoff.
    pub base_delay: Duration,
    /// Total page count assumed when discovery fails.
    pub fallback_total_pages: PageIndex,
    /// Listing page URL template containing `{page}`.
    pub listing_url_template: String,
    /// Responses larger than this are treated as transport failures.
    pub max_body_bytes: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
                "AppleWebKit/537.36"
            )
            .to_string(),
            concurrency: 8,
            request_timeout: Duration::from_secs(15),
            max_retries: 3,
            base_delay: Duration::from_millis(300),
            fallback_total_pages: 383,
            listing_url_template: "http://www.downcc.com/font/list_200_{page}.html".to_string(),
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

impl EngineSettings {
    /// The configured concurrency clamped into [`WORKER_RANGE`].
    pub fn worker_count(&self) -> usize {
        self.concurrency.clamp(WORKER_RANGE.0, WORKER_RANGE.1)
    }

    /// URL of the listing page with the given index.
    pub fn listing_url(&self, page: PageIndex) -> String {
        self.listing_url_template
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }
}
