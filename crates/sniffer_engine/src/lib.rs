//! Font catalog harvesting engine: concurrent page fetch, parse and filter,
//! streamed to the consumer as completion-ordered events.
mod discover;
mod engine;
mod fetch;
mod parse;
mod retry;
mod settings;
mod stats;
mod types;

pub use discover::{discover_total_pages, max_page_in_pager};
pub use engine::{ChannelEventSink, EventSink, Harvester, SearchStream};
pub use fetch::{ReqwestTransport, Transport};
pub use parse::parse_records;
pub use retry::RetryingFetcher;
pub use settings::{EngineSettings, WORKER_RANGE};
pub use stats::{RequestCounters, RunStats};
pub use types::{FontRecord, PageIndex, SearchEvent, TransportError};

pub use tokio_util::sync::CancellationToken;
