use crate::stats::RunStats;

/// 1-based index of a catalog listing page.
pub type PageIndex = u32;

/// One discovered catalog item: display name and absolute detail-page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRecord {
    pub name: String,
    pub detail_url: String,
}

/// Events streamed from a search run to the consumer, in production order.
///
/// `Result` events carry the page they were found on, but pages complete in
/// nondeterministic order; consumers must not assume page ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// Informational progress text.
    Status { text: String },
    /// One filtered record, fully resolved before emission.
    Result {
        record: FontRecord,
        source_page: PageIndex,
    },
    /// Reserved for construction-time or unexpected top-level failures.
    Error { text: String },
    /// Terminal marker of an uncancelled run. Carries the final stats.
    Done { total_found: usize, stats: RunStats },
}

/// A single collapsed transport failure: connection error, timeout and
/// non-2xx status (redirects included) are not distinguished to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
